use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::errors::{ApiError, ApiResult};
use crate::models::{RecipeResponse, SubscriptionResponse, UserResponse};
use actix_web::HttpRequest;
use sea_orm::{ConnectionTrait, DbErr, Paginator, SelectorTrait};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use utoipa::{IntoParams, ToSchema};

fn invalid_page() -> ApiError {
    ApiError::not_found("Invalid page.")
}

/// Raw `page` and `limit` query parameters.
///
/// Strings on purpose: a malformed `page` is a 404 and a malformed `limit` falls back
/// to the default size.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<String>,
    /// Page size (default: 6)
    pub limit: Option<String>,
}

/// Validated page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based.
    pub page: u64,
    pub size: u64,
}

impl TryFrom<&PageQuery> for PageRequest {
    type Error = ApiError;

    fn try_from(query: &PageQuery) -> ApiResult<Self> {
        let page = match query.page.as_deref().map(str::trim) {
            None => 1,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(invalid_page()),
            },
        };
        let size = query
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|n| *n >= 1)
            .map_or(DEFAULT_PAGE_SIZE, |n| n.min(MAX_PAGE_SIZE));
        Ok(PageRequest { page, size })
    }
}

impl PageRequest {
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.size).max(1)
    }

    /// The first page always exists, later pages only while there are items.
    pub fn check_range(&self, total: u64) -> ApiResult<()> {
        if self.page > self.page_count(total) {
            return Err(invalid_page());
        }
        Ok(())
    }
}

/// Counts the matches and loads the requested page.
///
/// Pages past the end are never queried, so `page * size` stays within the total.
pub async fn fetch<'db, C, S>(
    paginator: Paginator<'db, C, S>,
    request: &PageRequest,
) -> Result<(Vec<S::Item>, u64), DbErr>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    let total = paginator.num_items().await?;
    if request.page > request.page_count(total) {
        return Ok((Vec::new(), total));
    }
    let items = paginator.fetch_page(request.page - 1).await?;
    Ok((items, total))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    RecipePage = Page<RecipeResponse>,
    UserPage = Page<UserResponse>,
    SubscriptionPage = Page<SubscriptionResponse>
)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

fn page_url(req: &HttpRequest, page: Option<u64>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(req.query_string().as_bytes()) {
        if key != "page" {
            query.append_pair(&key, &value);
        }
    }
    if let Some(page) = page {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();

    let info = req.connection_info();
    let mut url = format!("{}://{}{}", info.scheme(), info.host(), req.path());
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }
    url
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, total: u64, request: &PageRequest, req: &HttpRequest) -> Self {
        let next = (request.page < request.page_count(total))
            .then(|| page_url(req, Some(request.page + 1)));
        let previous = match request.page {
            1 => None,
            2 => Some(page_url(req, None)),
            n => Some(page_url(req, Some(n - 1))),
        };
        Page {
            count: total,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn defaults_and_limits() {
        assert_eq!(
            PageRequest::try_from(&PageQuery::default()).unwrap(),
            PageRequest { page: 1, size: DEFAULT_PAGE_SIZE }
        );
        assert_eq!(
            PageRequest::try_from(&query(Some("3"), Some("2"))).unwrap(),
            PageRequest { page: 3, size: 2 }
        );
        assert_eq!(
            PageRequest::try_from(&query(None, Some("500"))).unwrap().size,
            MAX_PAGE_SIZE
        );
        for limit in ["abc", "0", "-3"] {
            assert_eq!(
                PageRequest::try_from(&query(None, Some(limit))).unwrap().size,
                DEFAULT_PAGE_SIZE
            );
        }
    }

    #[test]
    fn malformed_page_is_not_found() {
        for page in ["0", "abc", "-1", "18446744073709551616"] {
            assert!(matches!(
                PageRequest::try_from(&query(Some(page), None)),
                Err(ApiError::NotFound(_))
            ));
        }
    }

    #[test]
    fn huge_page_is_out_of_range() {
        let request = PageRequest::try_from(&query(Some("18446744073709551615"), None)).unwrap();
        assert_eq!(request.page, u64::MAX);
        assert!(matches!(request.check_range(10), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn pages_past_the_end_are_rejected() {
        let request = PageRequest { page: 3, size: 2 };
        assert!(request.check_range(5).is_ok());
        assert!(request.check_range(4).is_err());
        assert!(PageRequest { page: 1, size: 6 }.check_range(0).is_ok());
    }

    #[test]
    fn links_keep_other_query_parameters() {
        let req = TestRequest::get()
            .uri("/api/recipes/?tags=lunch&page=2&limit=1")
            .insert_header(("host", "food.test"))
            .to_http_request();
        let request = PageRequest { page: 2, size: 1 };
        let page = Page::new(vec![1], 3, &request, &req);

        assert_eq!(page.count, 3);
        assert_eq!(
            page.next.as_deref(),
            Some("http://food.test/api/recipes/?tags=lunch&limit=1&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://food.test/api/recipes/?tags=lunch&limit=1")
        );
    }
}
