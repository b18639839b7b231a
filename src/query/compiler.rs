use chrono::{DateTime, TimeDelta, Utc};

use crate::error::AppError;
use crate::query::params::{is_flag_set, split_list, QueryParams};
use crate::query::tree::{Query, QueryTree};
use crate::schema::document::fields;

/// Adds the clauses of one parameter to the tree.
///
/// A contributor only reads its own parameter and only appends, so the
/// result of any parameter combination is the AND of the parts.
type Contributor = fn(&QueryParams, DateTime<Utc>, &mut QueryTree);

const CONTRIBUTORS: &[Contributor] = &[
    days_back,
    include_content_types,
    include_subtypes,
    include_sections,
    include_distributor,
    include_tags,
    exclude_content_types,
    exclude_subtypes,
    exclude_sections,
    exclude_distributor,
    exclude_tags,
    must_include_thumbnail,
    exclude_story_ids,
];

/// Compile request parameters into a query tree, using the current time
/// for the `daysBack` window.
pub fn compile(params: &QueryParams) -> Result<QueryTree, AppError> {
    compile_at(params, Utc::now())
}

/// Compile against a fixed instant. Every time-dependent clause uses `now`.
pub fn compile_at(params: &QueryParams, now: DateTime<Utc>) -> Result<QueryTree, AppError> {
    let site = params.active_site()?;

    let mut tree = QueryTree::default();
    tree.must.push(Query::term(fields::CANONICAL_WEBSITE, site));

    for contribute in CONTRIBUTORS {
        contribute(params, now, &mut tree);
    }

    Ok(tree)
}

/// A tag value matches either the display text or the slug of one tag entry.
pub fn tag_match(tag: &str) -> Query {
    Query::nested(
        fields::TAGS,
        Query::any_of(vec![
            Query::term(fields::TAG_TEXT, tag),
            Query::term(fields::TAG_SLUG, tag),
        ]),
    )
}

fn section_match(sections: Vec<String>) -> Query {
    Query::nested(fields::SECTIONS, Query::terms(fields::SECTION_ID, sections))
}

fn terms_clause(field: &str, raw: Option<&str>) -> Option<Query> {
    let values = split_list(raw);
    (!values.is_empty()).then(|| Query::terms(field, values))
}

fn days_back(params: &QueryParams, now: DateTime<Utc>, tree: &mut QueryTree) {
    let Some(days) = params
        .days_back
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|days| *days >= 0)
    else {
        return;
    };

    let Some(start) = TimeDelta::try_days(days).and_then(|delta| now.checked_sub_signed(delta))
    else {
        return;
    };

    tree.filter
        .push(Query::range(fields::DISPLAY_DATE, start, now));
}

fn include_content_types(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    tree.must
        .extend(terms_clause(fields::TYPE, params.include_content_types.as_deref()));
}

fn include_subtypes(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    tree.must
        .extend(terms_clause(fields::SUBTYPE, params.include_subtypes.as_deref()));
}

fn include_sections(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    let sections = split_list(params.include_sections.as_deref());
    if !sections.is_empty() {
        tree.must.push(section_match(sections));
    }
}

fn include_distributor(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    tree.must.extend(terms_clause(
        fields::DISTRIBUTOR_REFERENCE_ID,
        params.include_distributor.as_deref(),
    ));
}

fn include_tags(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    let tags = split_list(params.include_tags.as_deref());
    if tags.is_empty() {
        return;
    }

    if is_flag_set(params.must_include_all_tags.as_deref()) {
        // Each tag may be satisfied by a different tag entry
        tree.must.extend(tags.iter().map(|tag| tag_match(tag)));
    } else {
        tree.must
            .push(Query::any_of(tags.iter().map(|tag| tag_match(tag)).collect()));
    }
}

fn exclude_content_types(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    tree.must_not
        .extend(terms_clause(fields::TYPE, params.exclude_content_types.as_deref()));
}

fn exclude_subtypes(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    tree.must_not
        .extend(terms_clause(fields::SUBTYPE, params.exclude_subtypes.as_deref()));
}

fn exclude_sections(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    let sections = split_list(params.exclude_sections.as_deref());
    if !sections.is_empty() {
        tree.must_not.push(section_match(sections));
    }
}

fn exclude_distributor(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    tree.must_not.extend(terms_clause(
        fields::DISTRIBUTOR_REFERENCE_ID,
        params.exclude_distributor.as_deref(),
    ));
}

fn exclude_tags(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    tree.must_not.extend(
        split_list(params.exclude_tags.as_deref())
            .iter()
            .map(|tag| tag_match(tag)),
    );
}

fn must_include_thumbnail(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    if is_flag_set(params.must_include_thumbnail.as_deref()) {
        tree.must.push(Query::exists(fields::THUMBNAIL));
    }
}

fn exclude_story_ids(params: &QueryParams, _now: DateTime<Utc>, tree: &mut QueryTree) {
    tree.must_not
        .extend(terms_clause(fields::ID, params.exclude_these_story_ids.as_deref()));
}
