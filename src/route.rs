//! Pages of the storefront and their paths

use std::fmt;

use url::form_urlencoded;

/// A storefront page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Home,
    /// `/cart`
    Cart,
    /// `/booking`
    Booking,
    /// `/payment`
    Payment,
    /// `/success-booking?trx_id=..&email=..`
    SuccessBooking { trx_id: String, email: String },
    /// `/my-booking`
    MyBooking,
    /// `/service/{slug}`
    Service(String),
    /// `/category/{slug}`
    Category(String),
}

impl Route {
    /// Path of this page, query values percent-encoded
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Cart => "/cart".to_string(),
            Route::Booking => "/booking".to_string(),
            Route::Payment => "/payment".to_string(),
            Route::SuccessBooking { trx_id, email } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("trx_id", trx_id)
                    .append_pair("email", email)
                    .finish();
                format!("/success-booking?{}", query)
            }
            Route::MyBooking => "/my-booking".to_string(),
            Route::Service(slug) => format!("/service/{}", slug),
            Route::Category(slug) => format!("/category/{}", slug),
        }
    }

    /// Parse a path produced by [`Route::path`]; unknown paths give `None`
    pub fn parse(path: &str) -> Option<Route> {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, query),
            None => (path, ""),
        };
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        match segments.as_slice() {
            [""] => Some(Route::Home),
            ["cart"] => Some(Route::Cart),
            ["booking"] => Some(Route::Booking),
            ["payment"] => Some(Route::Payment),
            ["my-booking"] => Some(Route::MyBooking),
            ["success-booking"] => {
                let mut trx_id = String::new();
                let mut email = String::new();
                for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                    match key.as_ref() {
                        "trx_id" => trx_id = value.into_owned(),
                        "email" => email = value.into_owned(),
                        _ => {}
                    }
                }
                Some(Route::SuccessBooking { trx_id, email })
            }
            ["service", slug] if !slug.is_empty() => Some(Route::Service(slug.to_string())),
            ["category", slug] if !slug.is_empty() => Some(Route::Category(slug.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path_carries_trx_and_email() {
        let route = Route::SuccessBooking {
            trx_id: "TRX1".into(),
            email: "jane@x.com".into(),
        };
        assert_eq!(route.path(), "/success-booking?trx_id=TRX1&email=jane%40x.com");
        assert_eq!(Route::parse(&route.path()), Some(route));
    }

    #[test]
    fn test_parse_known_and_unknown_paths() {
        assert_eq!(Route::parse("/"), Some(Route::Home));
        assert_eq!(Route::parse("/cart"), Some(Route::Cart));
        assert_eq!(
            Route::parse("/service/ac-cleaning"),
            Some(Route::Service("ac-cleaning".into()))
        );
        assert_eq!(
            Route::parse("/category/cleaning/"),
            Some(Route::Category("cleaning".into()))
        );
        assert_eq!(Route::parse("/service/"), None);
        assert_eq!(Route::parse("/admin"), None);
    }
}
