//! Parity probe: replay canned GraphQL requests against two endpoints and
//! diff the responses.
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

pub const DEFAULT_POST_SLUG: &str = "20251212-4-173036";
pub const DEFAULT_EXTERNAL_SLUG: &str = "mirrordaily_35695";

#[derive(Debug, Clone)]
pub struct ProbeCase {
    pub name: &'static str,
    pub body: Value,
}

/// The four requests covering list, count and unique lookups.
pub fn canned_cases(post_slug: &str, external_slug: &str) -> Vec<ProbeCase> {
    vec![
        ProbeCase {
            name: "posts_list",
            body: json!({
                "query": "query ($take:Int,$skip:Int,$orderBy:[PostOrderByInput!]!,$filter:PostWhereInput!){ postsCount(where:$filter) posts(take:$take,skip:$skip,orderBy:$orderBy,where:$filter){ id slug title publishedDate state } }",
                "variables": {
                    "take": 3,
                    "skip": 0,
                    "orderBy": [{"publishedDate": "desc"}],
                    "filter": {}
                }
            }),
        },
        ProbeCase {
            name: "post_by_slug",
            body: json!({
                "query": "query ($slug:String){ post(where:{slug:$slug}){ id slug title state } }",
                "variables": {"slug": post_slug}
            }),
        },
        ProbeCase {
            name: "externals_list",
            body: json!({
                "query": "query ($take:Int,$skip:Int,$orderBy:[ExternalOrderByInput!]!,$filter:ExternalWhereInput!){ externals(take:$take,skip:$skip,orderBy:$orderBy,where:$filter){ id slug title thumb brief publishedDate partner{ id slug name showOnIndex } } }",
                "variables": {
                    "take": 3,
                    "skip": 0,
                    "orderBy": [{"publishedDate": "desc"}],
                    "filter": {}
                }
            }),
        },
        ProbeCase {
            name: "external_by_slug",
            body: json!({
                "query": "query ($slug:String){ externals(where:{slug:{equals:$slug},state:{equals:\"published\"}}){ id slug title thumb brief content publishedDate extend_byline thumbCaption partner{ id slug name showOnIndex showThumb showBrief } updatedAt } }",
                "variables": {"slug": external_slug}
            }),
        },
    ]
}

/// Outcome of one request. `status` is 0 when no response arrived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeResult {
    pub name: String,
    pub status: u16,
    pub body: Vec<u8>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub name: String,
    #[serde(rename = "match")]
    pub matched: bool,
    pub target_status: u16,
    pub candidate_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

pub fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent("content-query/parity-probe")
        .timeout(Duration::from_secs(10))
        .build()?)
}

/// Run every case against `url`. Transport failures are recorded, not
/// returned.
pub async fn run_cases(client: &Client, url: &str, cases: &[ProbeCase]) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(cases.len());
    for case in cases {
        let mut result = ProbeResult {
            name: case.name.to_string(),
            ..Default::default()
        };
        match client.post(url).json(&case.body).send().await {
            Ok(resp) => {
                result.status = resp.status().as_u16();
                match resp.bytes().await {
                    Ok(body) => result.body = body.to_vec(),
                    Err(err) => result.error = Some(err.to_string()),
                }
            }
            Err(err) => {
                warn!(case = case.name, url, %err, "probe request failed");
                result.error = Some(err.to_string());
            }
        }
        results.push(result);
    }
    info!(url, n = results.len(), "probe run finished");
    results
}

/// Decide whether two responses agree, with a note explaining a mismatch.
pub fn compare_bodies(target: &ProbeResult, candidate: &ProbeResult) -> (bool, Option<&'static str>) {
    if target.error.is_some() || candidate.error.is_some() {
        let both_ok = target.error.is_none() && candidate.error.is_none();
        return (both_ok, Some("transport error"));
    }
    if target.status != candidate.status {
        return (false, Some("status code differ"));
    }
    let parsed = (
        serde_json::from_slice::<Value>(&target.body),
        serde_json::from_slice::<Value>(&candidate.body),
    );
    if let (Ok(t), Ok(c)) = parsed {
        return if t == c {
            (true, None)
        } else {
            (false, Some("body JSON differ"))
        };
    }
    if target.body == candidate.body {
        (true, None)
    } else {
        (false, Some("body differ"))
    }
}

/// Pair results by case name, in target order.
pub fn compare_runs(target: &[ProbeResult], candidate: &[ProbeResult]) -> Vec<Comparison> {
    target
        .iter()
        .map(|t| {
            let missing = ProbeResult {
                name: t.name.clone(),
                error: Some("no result".into()),
                ..Default::default()
            };
            let c = candidate.iter().find(|c| c.name == t.name).unwrap_or(&missing);
            let (matched, note) = compare_bodies(t, c);
            Comparison {
                name: t.name.clone(),
                matched,
                target_status: t.status,
                candidate_status: c.status,
                target_error: t.error.clone(),
                candidate_error: c.error.clone(),
                note,
            }
        })
        .collect()
}
