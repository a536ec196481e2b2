//! Mapping from domain errors to RFC 9457 Problem responses.

use http::StatusCode;
use tablegate_errors::Problem;
use tablegate_odata::Error as ODataError;

use crate::domain::error::DomainError;

/// Map a domain error to a Problem. Client-caused protocol errors keep their
/// full detail (offending token or field); upstream failures are logged and
/// flagged retryable.
pub fn domain_error_to_problem(e: &DomainError, instance: &str) -> Problem {
    let problem = match e {
        DomainError::Protocol(p) => protocol_problem(p),
        DomainError::SchemaNotFound(table) => Problem::new(
            StatusCode::NOT_FOUND,
            "Unknown Entity Set",
            format!("entity set '{table}' does not exist"),
        )
        .with_code("odata.schema_not_found"),
        DomainError::UpstreamTimeout(secs) => {
            tracing::error!(error = %e, "upstream timeout");
            Problem::new(
                StatusCode::GATEWAY_TIMEOUT,
                "Upstream Timeout",
                format!("warehouse query exceeded the {secs}s budget"),
            )
            .with_code("odata.upstream_timeout")
            .with_retryable()
        }
        DomainError::Query(_) => {
            tracing::error!(error = %e, "upstream query failure");
            Problem::new(
                StatusCode::BAD_GATEWAY,
                "Upstream Query Error",
                "the warehouse rejected or failed the query",
            )
            .with_code("odata.upstream_query")
            .with_retryable()
        }
    };
    problem.with_instance(instance)
}

fn protocol_problem(e: &ODataError) -> Problem {
    let (title, code) = match e {
        ODataError::FilterSyntax { .. } => ("Invalid Filter", "odata.invalid_filter"),
        ODataError::UnknownField(_) => ("Unknown Field", "odata.unknown_field"),
        ODataError::UnsupportedOperator(_) => ("Unsupported Operator", "odata.unsupported_operator"),
        ODataError::UnsupportedOption(_) => ("Unsupported Option", "odata.unsupported_option"),
        ODataError::InvalidOrderBy(_) => ("Invalid OrderBy", "odata.invalid_orderby"),
        ODataError::InvalidQueryOption { .. } => {
            ("Invalid Query Option", "odata.invalid_query_option")
        }
    };
    Problem::new(StatusCode::UNPROCESSABLE_ENTITY, title, e.to_string()).with_code(code)
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        domain_error_to_problem(&e, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_error_maps_to_422_with_position() {
        let e = DomainError::Protocol(ODataError::FilterSyntax {
            position: 9,
            message: "unterminated string literal".to_owned(),
        });
        let p = domain_error_to_problem(&e, "/odata/AdReport");
        assert_eq!(p.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(p.code, "odata.invalid_filter");
        assert!(p.detail.contains("offset 9"));
        assert!(!p.retryable);
    }

    #[test]
    fn schema_not_found_maps_to_404() {
        let p = domain_error_to_problem(
            &DomainError::SchemaNotFound("Nope".to_owned()),
            "/odata/Nope",
        );
        assert_eq!(p.status, StatusCode::NOT_FOUND);
        assert_eq!(p.instance, "/odata/Nope");
    }

    #[test]
    fn upstream_errors_are_retryable() {
        let p = domain_error_to_problem(&DomainError::UpstreamTimeout(30), "/odata/T");
        assert_eq!(p.status, StatusCode::GATEWAY_TIMEOUT);
        assert!(p.retryable);

        let p = domain_error_to_problem(&DomainError::Query("boom".to_owned()), "/odata/T");
        assert_eq!(p.status, StatusCode::BAD_GATEWAY);
        assert!(p.retryable);
        // Upstream detail stays in the logs, not in the response
        assert!(!p.detail.contains("boom"));
    }
}
