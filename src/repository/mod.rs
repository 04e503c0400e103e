//! Data access functions, one module per aggregate.

pub mod catalog;
pub mod memberships;
pub mod recipes;
pub mod subscriptions;
pub mod users;

use crate::services::InsertOutcome;
use sea_orm::{DbErr, SqlErr};

/// Maps a unique-constraint violation to [`InsertOutcome::Duplicate`].
pub(crate) fn insert_outcome<T>(result: Result<T, DbErr>) -> Result<InsertOutcome, DbErr> {
    match result {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Ok(InsertOutcome::Duplicate),
            _ => Err(e),
        },
    }
}
