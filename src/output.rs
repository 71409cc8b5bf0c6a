//! Rendering of command line results as text or JSON.

use crate::access_control::{
    AccessDecision, AccessGrant, AccessRequest, ProtectedAction, ProtectedRefSpec,
};
use crate::error::ParseError;
use serde_json::{Value, json};
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ParseError::UnknownOutputFormat(s.to_string())),
        }
    }
}

pub fn render_decision(
    format: OutputFormat,
    request: &AccessRequest<'_>,
    decision: &AccessDecision,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "{} {} '{}' by user {}: {}",
                request.action, request.kind, request.ref_name, request.actor.id, decision
            );
            if !decision.governing().is_empty() {
                let _ = write!(out, " (governed by {})", decision.governing().join(", "));
            }
            out
        }
        OutputFormat::Json => {
            let mut value = json!({
                "action": request.action,
                "kind": request.kind,
                "ref": request.ref_name,
                "actor": request.actor.id,
            });
            if let (Value::Object(map), Ok(Value::Object(decision))) =
                (&mut value, serde_json::to_value(decision))
            {
                map.extend(decision);
            }
            value.to_string()
        }
    }
}

/// `results` pairs each ref name with its protection status
pub fn render_protection(format: OutputFormat, results: &[(String, bool)]) -> String {
    match format {
        OutputFormat::Text => results
            .iter()
            .map(|(name, protected)| {
                format!(
                    "{}: {}",
                    name,
                    if *protected { "protected" } else { "unprotected" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            let entries: Vec<Value> = results
                .iter()
                .map(|(name, protected)| json!({ "ref": name, "protected": protected }))
                .collect();
            Value::Array(entries).to_string()
        }
    }
}

pub fn render_specs(format: OutputFormat, specs: &[&ProtectedRefSpec]) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for spec in specs {
                let _ = writeln!(out, "{} ({})", spec.name(), spec.kind);
                for action in [
                    ProtectedAction::Push,
                    ProtectedAction::Merge,
                    ProtectedAction::Unprotect,
                ] {
                    let _ = writeln!(out, "  {}: {}", action, grants_text(spec, action));
                }
            }
            out.trim_end().to_string()
        }
        OutputFormat::Json => {
            let entries: Vec<Value> = specs.iter().map(|spec| spec_json(spec)).collect();
            Value::Array(entries).to_string()
        }
    }
}

fn grants(spec: &ProtectedRefSpec, action: ProtectedAction) -> Vec<AccessGrant> {
    spec.rules_for(action).map(|rule| rule.grant).collect()
}

fn grants_text(spec: &ProtectedRefSpec, action: ProtectedAction) -> String {
    let grants = grants(spec, action);
    if grants.is_empty() {
        return match action {
            ProtectedAction::Unprotect => "anyone".to_string(),
            ProtectedAction::Push | ProtectedAction::Merge => "no one".to_string(),
        };
    }
    grants
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn spec_json(spec: &ProtectedRefSpec) -> Value {
    json!({
        "name": spec.name(),
        "kind": spec.kind,
        "wildcard": spec.pattern.is_wildcard(),
        "created_at": spec.created_at,
        "code_owner_approval_required": spec.code_owner_approval_required,
        "push": grants(spec, ProtectedAction::Push),
        "merge": grants(spec, ProtectedAction::Merge),
        "unprotect": grants(spec, ProtectedAction::Unprotect),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::{Actor, RoleTier};

    #[test]
    fn test_parse_output_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_decision_json_merges_fields() {
        let actor = Actor::new(3, RoleTier::Developer);
        let request = AccessRequest::branch(&actor, ProtectedAction::Push, "main");
        let decision = AccessDecision::denied("requires maintainer", vec!["main".into()]);

        let rendered = render_decision(OutputFormat::Json, &request, &decision);
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["decision"], "denied");
        assert_eq!(value["action"], "push");
        assert_eq!(value["kind"], "branch");
        assert_eq!(value["actor"], 3);
        assert_eq!(value["governing"][0], "main");
    }

    #[test]
    fn test_render_decision_text() {
        let actor = Actor::new(3, RoleTier::Developer);
        let request = AccessRequest::branch(&actor, ProtectedAction::Push, "main");
        let decision = AccessDecision::denied("nope", vec!["main".into(), "*".into()]);

        let rendered = render_decision(OutputFormat::Text, &request, &decision);
        assert_eq!(
            rendered,
            "push branch 'main' by user 3: denied: nope (governed by main, *)"
        );
    }

    #[test]
    fn test_render_specs_text() {
        let spec = ProtectedRefSpec::branch("main")
            .allow(ProtectedAction::Push, AccessGrant::Role(RoleTier::Maintainer))
            .allow(ProtectedAction::Push, AccessGrant::User(7));

        let rendered = render_specs(OutputFormat::Text, &[&spec]);
        assert_eq!(
            rendered,
            "main (branch)\n  push: role:maintainer, user:7\n  merge: no one\n  unprotect: anyone"
        );
    }

    #[test]
    fn test_render_protection_json() {
        let rendered = render_protection(
            OutputFormat::Json,
            &[("main".to_string(), true), ("dev".to_string(), false)],
        );
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value[0]["protected"], true);
        assert_eq!(value[1]["ref"], "dev");
    }
}
