use crate::adapter::ValueAdapter;
use crate::{ParameterSet, RelatednessError, RelatednessRequest, RequestNode, Result};
use relgraph_core::Corpus;

/// Reject malformed requests before any corpus work is scheduled.
///
/// Checks run in order: queries, compare nodes, node types, then that every
/// node's field (and its adapted facet field) exists in the corpus.
pub fn validate_request(request: &RelatednessRequest, params: &ParameterSet, corpus: &dyn Corpus) -> Result<()> {
    if request.queries.iter().all(|q| q.trim().is_empty()) {
        return Err(RelatednessError::MissingQueries);
    }
    if request.compare.is_empty() {
        return Err(RelatednessError::EmptyCompare);
    }
    check_types(&request.compare)?;
    check_fields(&request.compare, params, corpus)
}

fn check_types(nodes: &[RequestNode]) -> Result<()> {
    for node in nodes {
        if node.field_type.trim().is_empty() {
            return Err(RelatednessError::EmptyType);
        }
        check_types(node.children())?;
    }
    Ok(())
}

fn check_fields(nodes: &[RequestNode], params: &ParameterSet, corpus: &dyn Corpus) -> Result<()> {
    for node in nodes {
        ValueAdapter::new(corpus, params, &node.field_type)?;
        check_fields(node.children(), params, corpus)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use relgraph_core::MemoryCorpus;
    use serde_json::json;
    use std::collections::HashMap;

    fn corpus() -> MemoryCorpus {
        MemoryCorpus::from_documents(vec![json!({"jobtitle": "nurse", "skills": ["triage"]})]).unwrap()
    }

    fn validate(request: &RelatednessRequest) -> Result<()> {
        validate_request(request, &ParameterSet::default(), &corpus())
    }

    fn request(queries: &[&str], compare: Vec<RequestNode>) -> RelatednessRequest {
        RelatednessRequest::new(queries.iter().map(|q| q.to_string()).collect(), compare)
    }

    #[test]
    fn test_valid_request() {
        let req = request(
            &["jobtitle:nurse"],
            vec![RequestNode::new("skills").with_compare(vec![RequestNode::new("jobtitle")])],
        );
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn test_missing_queries() {
        let req = request(&[], vec![RequestNode::new("skills")]);
        assert!(matches!(validate(&req), Err(RelatednessError::MissingQueries)));
        let req = request(&["  "], vec![RequestNode::new("skills")]);
        assert!(matches!(validate(&req), Err(RelatednessError::MissingQueries)));
    }

    #[test]
    fn test_empty_compare() {
        let req = request(&["*:*"], Vec::new());
        assert!(matches!(validate(&req), Err(RelatednessError::EmptyCompare)));
    }

    #[test]
    fn test_nested_empty_compare_is_a_leaf() {
        let req = request(&["*:*"], vec![RequestNode::new("skills").with_compare(Vec::new())]);
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn test_nested_empty_type() {
        let req = request(
            &["*:*"],
            vec![RequestNode::new("skills").with_compare(vec![RequestNode::new("")])],
        );
        let err = validate(&req).unwrap_err();
        assert!(matches!(err, RelatednessError::EmptyType));
        assert_eq!(err.to_string(), "A request node contains empty or null type.");
    }

    #[test]
    fn test_types_checked_before_fields() {
        // the unknown field comes first but the empty type still wins
        let req = request(&["*:*"], vec![RequestNode::new("salary"), RequestNode::new(" ")]);
        assert!(matches!(validate(&req), Err(RelatednessError::EmptyType)));
    }

    #[test]
    fn test_unknown_nested_field() {
        let req = request(
            &["*:*"],
            vec![RequestNode::new("skills").with_compare(vec![RequestNode::new("salary")])],
        );
        let err = validate(&req).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(matches!(err, RelatednessError::UnknownField { ref field, .. } if field == "salary"));
    }

    #[test]
    fn test_unknown_facet_field() {
        let params = EngineConfig::default()
            .with_invariant("skills.facet-field", "id-name")
            .parameter_set(HashMap::new());
        let req = request(&["*:*"], vec![RequestNode::new("skills")]);
        let err = validate_request(&req, &params, &corpus()).unwrap_err();
        assert!(err.to_string().contains("skills.id-name"));
    }
}
