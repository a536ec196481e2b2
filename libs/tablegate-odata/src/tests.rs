use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::ast::{CompareOperator, Expr, Value};
use crate::filter::{FilterNode, FilterOp, parse_and_resolve};
use crate::parser::parse_filter;
use crate::schema::{ColumnDescriptor, WarehouseType};
use crate::{Error, ODataLimits, ODataQuery, OrderBy, SortDir, next_link, paginate};

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("Date", WarehouseType::Date, 0),
        ColumnDescriptor::new("Media", WarehouseType::String, 1),
        ColumnDescriptor::new("Campaign", WarehouseType::String, 2),
        ColumnDescriptor::new("Clicks", WarehouseType::Integer, 3),
        ColumnDescriptor::new("Spend", WarehouseType::Numeric, 4),
    ]
}

fn num(s: &str) -> Value {
    Value::Number(BigDecimal::from_str(s).unwrap())
}

#[test]
fn parses_simple_comparison() {
    let expr = parse_filter("Media eq 'Naver'").unwrap();
    assert_eq!(
        expr,
        Expr::Compare(
            Box::new(Expr::Identifier("Media".to_owned())),
            CompareOperator::Eq,
            Box::new(Expr::Value(Value::String("Naver".to_owned()))),
        )
    );
}

#[test]
fn and_binds_tighter_than_or() {
    // a or b and c  =>  a or (b and c)
    let expr = parse_filter("Clicks gt 1 or Clicks lt 5 and Media eq 'x'").unwrap();
    let Expr::Or(_, right) = expr else {
        panic!("expected top-level or");
    };
    assert!(matches!(*right, Expr::And(_, _)));
}

#[test]
fn parentheses_override_precedence() {
    let expr = parse_filter("(Clicks gt 1 or Clicks lt 5) and Media eq 'x'").unwrap();
    let Expr::And(left, _) = expr else {
        panic!("expected top-level and");
    };
    assert!(matches!(*left, Expr::Or(_, _)));
}

#[test]
fn chained_and_is_left_associative() {
    let expr = parse_filter("Clicks gt 1 and Clicks lt 5 and Media ne 'x'").unwrap();
    let Expr::And(left, _) = expr else {
        panic!("expected top-level and");
    };
    assert!(matches!(*left, Expr::And(_, _)));
}

#[test]
fn not_binds_tighter_than_and() {
    let expr = parse_filter("not Media eq 'x' and Clicks gt 1").unwrap();
    let Expr::And(left, _) = expr else {
        panic!("expected top-level and");
    };
    assert!(matches!(*left, Expr::Not(_)));
}

#[test]
fn doubled_quote_escapes() {
    let expr = parse_filter("Media eq 'O''Brien'").unwrap();
    let Expr::Compare(_, _, right) = expr else {
        panic!("expected comparison");
    };
    assert_eq!(*right, Expr::Value(Value::String("O'Brien".to_owned())));
}

#[test]
fn literal_kinds() {
    assert_eq!(
        parse_filter("Clicks eq 100").unwrap(),
        Expr::Compare(
            Box::new(Expr::Identifier("Clicks".to_owned())),
            CompareOperator::Eq,
            Box::new(Expr::Value(num("100"))),
        )
    );
    let decimal = parse_filter("Spend ge -12.5").unwrap();
    let Expr::Compare(_, _, right) = decimal else {
        panic!("expected comparison");
    };
    assert_eq!(*right, Expr::Value(num("-12.5")));

    let boolean = parse_filter("Active eq true").unwrap();
    let Expr::Compare(_, _, right) = boolean else {
        panic!("expected comparison");
    };
    assert_eq!(*right, Expr::Value(Value::Bool(true)));

    let null = parse_filter("Media ne null").unwrap();
    let Expr::Compare(_, _, right) = null else {
        panic!("expected comparison");
    };
    assert_eq!(*right, Expr::Value(Value::Null));
}

#[test]
fn syntax_error_reports_position() {
    let err = parse_filter("Media eq 'Naver").unwrap_err();
    assert_eq!(
        err,
        Error::FilterSyntax {
            position: 9,
            message: "unterminated string literal".to_owned()
        }
    );

    let err = parse_filter("Media eq #").unwrap_err();
    let Error::FilterSyntax { position, .. } = err else {
        panic!("expected syntax error");
    };
    assert_eq!(position, 9);
}

#[test]
fn trailing_tokens_rejected() {
    let err = parse_filter("Media eq 'x' Clicks").unwrap_err();
    assert!(matches!(err, Error::FilterSyntax { .. }));
}

#[test]
fn resolves_against_columns_case_insensitively() {
    let node = parse_and_resolve("media eq 'Naver'", &columns()).unwrap();
    assert_eq!(
        node,
        FilterNode::binary("Media", FilterOp::Eq, Value::String("Naver".to_owned()))
    );
}

#[test]
fn unknown_field_is_rejected() {
    let err = parse_and_resolve("Publisher eq 'x'", &columns()).unwrap_err();
    assert_eq!(err, Error::UnknownField("Publisher".to_owned()));
}

#[test]
fn string_functions_resolve_to_pattern_ops() {
    let node = parse_and_resolve("contains(Campaign, 'brand')", &columns()).unwrap();
    assert_eq!(
        node,
        FilterNode::binary(
            "Campaign",
            FilterOp::Contains,
            Value::String("brand".to_owned())
        )
    );

    let node = parse_and_resolve("startswith(Media, 'Na')", &columns()).unwrap();
    assert!(matches!(
        node,
        FilterNode::Binary {
            op: FilterOp::StartsWith,
            ..
        }
    ));

    let node = parse_and_resolve("endswith(Media, 'ver')", &columns()).unwrap();
    assert!(matches!(
        node,
        FilterNode::Binary {
            op: FilterOp::EndsWith,
            ..
        }
    ));
}

#[test]
fn unsupported_function_is_rejected() {
    let err = parse_and_resolve("tolower(Media) eq 'naver'", &columns()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperator(_)));
}

#[test]
fn field_to_field_comparison_is_rejected() {
    let err = parse_and_resolve("Media eq Campaign", &columns()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperator(_)));
}

#[test]
fn composite_filter_resolves() {
    let node = parse_and_resolve("Clicks gt 100 and Media eq 'Naver'", &columns()).unwrap();
    let FilterNode::Composite { op, children } = node else {
        panic!("expected composite");
    };
    assert_eq!(op, FilterOp::And);
    assert_eq!(children.len(), 2);
    assert_eq!(
        children[0],
        FilterNode::binary("Clicks", FilterOp::Gt, num("100"))
    );
}

#[test]
fn orderby_parse_and_render() {
    let order = OrderBy::parse("Date desc, Campaign").unwrap();
    assert_eq!(order.0.len(), 2);
    assert_eq!(order.0[0].dir, SortDir::Desc);
    assert_eq!(order.0[1].dir, SortDir::Asc);
    assert_eq!(order.render(), "Date desc,Campaign");

    assert!(OrderBy::parse("Date sideways").is_err());
    assert!(OrderBy::parse("Date desc extra").is_err());
}

#[test]
fn options_parse_from_pairs() {
    let limits = ODataLimits::default();
    let pairs = vec![
        ("$filter", "Clicks gt 100"),
        ("$select", "Date, Media ,Clicks"),
        ("$orderby", "Date desc"),
        ("$top", "10"),
        ("$skip", "20"),
        ("$count", "true"),
        ("api_key", "ignored"),
    ];
    let query = ODataQuery::from_pairs(pairs, &limits).unwrap();
    assert_eq!(query.raw_filter.as_deref(), Some("Clicks gt 100"));
    assert!(query.filter.is_some());
    assert_eq!(
        query.select.as_deref(),
        Some(
            &[
                "Date".to_owned(),
                "Media".to_owned(),
                "Clicks".to_owned()
            ][..]
        )
    );
    assert_eq!(query.top, Some(10));
    assert_eq!(query.skip, Some(20));
    assert!(query.count);
}

#[test]
fn unknown_dollar_option_is_rejected() {
    let limits = ODataLimits::default();
    let err = ODataQuery::from_pairs(vec![("$expand", "Orders")], &limits).unwrap_err();
    assert_eq!(err, Error::UnsupportedOption("$expand".to_owned()));
}

#[test]
fn bad_top_is_rejected() {
    let limits = ODataLimits::default();
    let err = ODataQuery::from_pairs(vec![("$top", "-5")], &limits).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidQueryOption { option: "$top", .. }
    ));
}

#[test]
fn has_more_at_exact_page_boundary() {
    let info = paginate(10, 10, 0);
    assert!(info.has_more);
    assert_eq!(info.next_skip(), 10);

    let info = paginate(9, 10, 0);
    assert!(!info.has_more);

    // $top=0 never reports a next page
    let info = paginate(0, 0, 0);
    assert!(!info.has_more);
}

#[test]
fn next_link_round_trips() {
    let limits = ODataLimits::default();
    let pairs = vec![
        ("$filter", "Media eq 'Naver' and Clicks gt 100"),
        ("$orderby", "Date desc"),
        ("$top", "10"),
        ("$skip", "0"),
        ("$count", "true"),
    ];
    let query = ODataQuery::from_pairs(pairs, &limits).unwrap();
    let info = paginate(10, limits.effective_limit(query.top), query.skip_or_zero());
    let link = next_link("https://svc.example/odata/AdReport", &query, &info).unwrap();

    let url = url::Url::parse(&link).unwrap();
    let reparsed_pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let reparsed = ODataQuery::from_pairs(
        reparsed_pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        &limits,
    )
    .unwrap();

    assert_eq!(reparsed.raw_filter, query.raw_filter);
    assert_eq!(reparsed.select, query.select);
    assert_eq!(reparsed.order, query.order);
    assert_eq!(reparsed.top, Some(10));
    assert_eq!(reparsed.count, query.count);
    // Only $skip advances, by exactly the effective page size
    assert_eq!(reparsed.skip, Some(10));
}

#[test]
fn no_next_link_on_short_page() {
    let query = ODataQuery::new().with_top(10);
    let info = paginate(9, 10, 0);
    assert_eq!(next_link("https://svc.example/odata/T", &query, &info), None);
}
