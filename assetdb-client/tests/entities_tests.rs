mod common;

use assetdb_client::entities::{
    get_archived_assets, get_assets, get_last_version_by_subset_name, get_last_versions,
    get_output_link_versions, get_projects, get_representation_parents, get_representations,
    get_subset_families, get_subsets, get_thumbnail_id_from_source, get_version_by_id,
    get_versions, get_whole_project, version_is_latest, AssetQuery, RepresentationQuery,
    SubsetQuery, VersionQuery,
};
use assetdb_client::ClientError;
use common::{doc, edges, page, project_data, strings, RecordingConnection};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

// ── Projects ─────────────────────────────────────────────────────

#[tokio::test]
async fn neither_active_nor_inactive_returns_nothing() {
    let con = RecordingConnection::new().with_project(json!({"name": "a", "active": true}));

    let projects = get_projects(&con, false, false, None, None).await.unwrap();
    assert!(projects.is_empty());
    assert!(con.untouched());
}

#[tokio::test]
async fn active_and_inactive_returns_every_project() {
    let con = RecordingConnection::new()
        .with_project(json!({"name": "a", "active": true}))
        .with_project(json!({"name": "b", "active": false}));

    let projects = get_projects(&con, true, true, None, None).await.unwrap();
    let ids: Vec<_> = projects.iter().map(|project| project["_id"].clone()).collect();
    assert_eq!(ids, vec![json!("a"), json!("b")]);
    assert_eq!(projects[1]["data"]["active"], json!(false));
}

#[tokio::test]
async fn inactive_only_keeps_inactive_projects() {
    let con = RecordingConnection::new()
        .with_project(json!({"name": "a", "active": true}))
        .with_project(json!({"name": "b", "active": false}));

    let projects = get_projects(&con, false, true, None, None).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], json!("b"));
}

// ── Unavailable operations ───────────────────────────────────────

#[test]
fn unavailable_operations_report_not_implemented() {
    assert!(get_whole_project().unwrap_err().is_not_implemented());
    assert!(get_archived_assets().unwrap_err().is_not_implemented());
    assert!(get_output_link_versions().unwrap_err().is_not_implemented());
}

#[tokio::test]
async fn context_filters_are_unsupported() {
    let con = RecordingConnection::new();
    let query = RepresentationQuery {
        context_filters: Some(BTreeMap::from([("ext".to_string(), strings(&["abc"]))])),
        ..Default::default()
    };

    let err = get_representations(&con, "proj1", &query).await.unwrap_err();
    assert!(matches!(err, ClientError::Unsupported(_)));
    assert!(con.untouched());
}

// ── Assets ───────────────────────────────────────────────────────

#[tokio::test]
async fn assets_carry_converted_tasks() {
    let folder = json!({
        "id": "f1",
        "name": "sh010",
        "parentId": null,
        "active": true,
        "tasks": edges(vec![json!({"name": "comp", "taskType": "Compositing"})])
    });
    let con = RecordingConnection::new()
        .respond(project_data("folders", page(vec![folder], "c1", false)));

    let assets = get_assets(&con, "proj1", &AssetQuery::default()).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["_id"], json!("f1"));
    assert_eq!(assets[0]["parent"], json!("proj1"));
    assert_eq!(
        assets[0]["data"]["tasks"],
        json!({"comp": {"type": "Compositing"}})
    );

    let request = &con.requests()[0];
    assert!(request.query.contains("tasks {"));
    assert!(request.query.contains("taskType"));
}

#[tokio::test]
async fn assets_without_task_fields_skip_the_task_selection() {
    let con = RecordingConnection::new()
        .respond(project_data("folders", page(vec![json!({"id": "f1"})], "c1", false)));
    let query = AssetQuery {
        fields: Some(strings(&["_id", "name"])),
        ..Default::default()
    };

    get_assets(&con, "proj1", &query).await.unwrap();
    assert!(!con.requests()[0].query.contains("tasks"));
}

#[tokio::test]
async fn archived_assets_query_inactive_folders() {
    let con = RecordingConnection::new().respond(project_data(
        "folders",
        page(
            vec![
                json!({"id": "f1", "active": false}),
                json!({"id": "f2", "active": true}),
            ],
            "c1",
            false,
        ),
    ));
    let query = AssetQuery {
        archived: true,
        fields: Some(strings(&["_id"])),
        ..Default::default()
    };

    let assets = get_assets(&con, "proj1", &query).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["_id"], json!("f1"));
    assert!(con.requests()[0].query.contains("active"));
}

// ── Subsets ──────────────────────────────────────────────────────

#[tokio::test]
async fn subsets_convert_to_legacy_documents() {
    let con = RecordingConnection::new().respond(project_data(
        "subsets",
        edges(vec![json!({
            "id": "s1",
            "name": "modelMain",
            "folderId": "f1",
            "family": "model",
            "active": true
        })]),
    ));
    let query = SubsetQuery {
        asset_ids: Some(strings(&["f1"])),
        ..Default::default()
    };

    let subsets = get_subsets(&con, "proj1", &query).await.unwrap();
    assert_eq!(subsets[0]["parent"], json!("f1"));
    assert_eq!(subsets[0]["data"]["families"], json!(["model"]));
    assert_eq!(con.requests()[0].variables["folderIds"], json!(["f1"]));
}

#[tokio::test]
async fn project_wide_subset_families() {
    let con = RecordingConnection::new()
        .respond(json!({"project": {"subsetFamilies": ["model", "look"]}}));

    let families = get_subset_families(&con, "proj1", None).await.unwrap();
    assert_eq!(families, BTreeSet::from(["look".to_string(), "model".to_string()]));
    assert!(con.requests()[0].query.contains("subsetFamilies"));
}

#[tokio::test]
async fn subset_families_of_given_subsets() {
    let con = RecordingConnection::new().respond(project_data(
        "subsets",
        edges(vec![
            json!({"id": "s1", "family": "model"}),
            json!({"id": "s2", "family": "model"}),
        ]),
    ));
    let ids = strings(&["s1", "s2"]);

    let families = get_subset_families(&con, "proj1", Some(ids.as_slice())).await.unwrap();
    assert_eq!(families, BTreeSet::from(["model".to_string()]));
}

// ── Versions ─────────────────────────────────────────────────────

#[tokio::test]
async fn hero_versions_link_their_source_version() {
    let con = RecordingConnection::new()
        .respond(project_data(
            "versions",
            edges(vec![
                json!({"id": "H1", "version": -3, "subsetId": "S"}),
                json!({"id": "V122", "version": 2, "subsetId": "S"}),
            ]),
        ))
        .respond(project_data(
            "versions",
            edges(vec![json!({"id": "V123", "version": 3, "subsetId": "S"})]),
        ));
    let query = VersionQuery {
        subset_ids: Some(strings(&["S"])),
        hero: true,
        ..Default::default()
    };

    let versions = get_versions(&con, "proj1", &query).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["type"], json!("hero_version"));
    assert_eq!(versions[0]["version_id"], json!("V123"));
    assert_eq!(versions[1]["type"], json!("version"));
    assert_eq!(versions[1]["name"], json!(2));

    let requests = con.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].variables["subsetIds"], json!(["S"]));
    assert_eq!(requests[1].variables["versions"], json!([3]));
}

#[tokio::test]
async fn standard_versions_need_no_second_lookup() {
    let con = RecordingConnection::new().respond(project_data(
        "versions",
        edges(vec![json!({"id": "V1", "version": 1, "subsetId": "S"})]),
    ));

    let version = get_version_by_id(&con, "proj1", "V1", None).await.unwrap().unwrap();
    assert_eq!(version["_id"], json!("V1"));
    let requests = con.requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].variables.contains_key("heroOnly"));
    assert!(!requests[0].variables.contains_key("latestOnly"));
}

#[tokio::test]
async fn last_versions_are_keyed_by_subset() {
    let con = RecordingConnection::new().respond(project_data(
        "versions",
        edges(vec![
            json!({"id": "V3", "version": 3, "subsetId": "S1"}),
            json!({"id": "V7", "version": 7, "subsetId": "S2"}),
        ]),
    ));
    let subset_ids = strings(&["S1", "S2"]);
    let fields = strings(&["_id"]);

    let last = get_last_versions(&con, "proj1", &subset_ids, Some(fields.as_slice()))
        .await
        .unwrap();
    assert_eq!(last["S1"]["_id"], json!("V3"));
    assert_eq!(last["S2"]["_id"], json!("V7"));

    let request = &con.requests()[0];
    assert_eq!(request.variables["latestOnly"], json!(true));
    assert!(request.query.contains("subsetId"));
}

#[tokio::test]
async fn last_version_by_subset_name_walks_asset_and_subset() {
    let con = RecordingConnection::new()
        .respond(project_data(
            "folders",
            page(vec![json!({"id": "f1", "active": true})], "c1", false),
        ))
        .respond(project_data(
            "subsets",
            edges(vec![json!({"id": "s1", "name": "modelMain", "folderId": "f1", "active": true})]),
        ))
        .respond(project_data(
            "versions",
            edges(vec![json!({"id": "V5", "version": 5, "subsetId": "s1"})]),
        ));

    let version =
        get_last_version_by_subset_name(&con, "proj1", "modelMain", None, Some("sh010"), None)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(version["_id"], json!("V5"));

    let requests = con.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].variables["folderNames"], json!(["sh010"]));
    assert_eq!(requests[1].variables["folderIds"], json!(["f1"]));
    assert_eq!(requests[2].variables["subsetIds"], json!(["s1"]));
}

#[tokio::test]
async fn last_version_by_subset_name_stops_at_missing_asset() {
    let con = RecordingConnection::new()
        .respond(project_data("folders", page(vec![], "c1", false)));

    let version =
        get_last_version_by_subset_name(&con, "proj1", "modelMain", None, Some("nope"), None)
            .await
            .unwrap();
    assert!(version.is_none());
    assert_eq!(con.requests().len(), 1);
}

#[tokio::test]
async fn last_version_by_subset_name_needs_an_asset() {
    let con = RecordingConnection::new();
    let version = get_last_version_by_subset_name(&con, "proj1", "modelMain", None, None, None)
        .await
        .unwrap();
    assert!(version.is_none());
    assert!(con.untouched());
}

#[tokio::test]
async fn version_is_latest_compares_ids() {
    let response = json!({
        "project": {"version": {"subset": {"latestVersion": {"id": "V3"}}}}
    });
    let con = RecordingConnection::new()
        .respond(response.clone())
        .respond(response);

    assert!(version_is_latest(&con, "proj1", "V3").await.unwrap());
    assert!(!version_is_latest(&con, "proj1", "V2").await.unwrap());
    assert_eq!(con.requests()[1].variables["versionId"], json!("V2"));
}

// ── Representations ──────────────────────────────────────────────

#[tokio::test]
async fn neither_standard_nor_archived_returns_nothing() {
    let con = RecordingConnection::new();
    let query = RepresentationQuery {
        standard: false,
        archived: false,
        ..Default::default()
    };

    assert!(get_representations(&con, "proj1", &query).await.unwrap().is_empty());
    assert!(con.untouched());
}

#[tokio::test]
async fn representation_parents_are_legacy_documents() {
    let con = RecordingConnection::new()
        .with_project(json!({"name": "proj1", "code": "p1"}))
        .respond(project_data(
            "representations",
            edges(vec![json!({
                "id": "r1",
                "version": {
                    "id": "v1",
                    "version": 2,
                    "subsetId": "s1",
                    "subset": {
                        "id": "s1",
                        "name": "modelMain",
                        "folderId": "f1",
                        "family": "model",
                        "folder": {"id": "f1", "name": "sh010"}
                    }
                }
            })]),
        ));
    let representation = doc(json!({"_id": "r1"}));

    let parents = get_representation_parents(&con, "proj1", &representation)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parents.version.unwrap()["name"], json!(2));
    assert_eq!(parents.subset.unwrap()["parent"], json!("f1"));
    let folder = parents.folder.unwrap();
    assert_eq!(folder["type"], json!("asset"));
    assert_eq!(folder["data"]["tasks"], json!({}));
    assert_eq!(parents.project.unwrap()["_id"], json!("proj1"));
}

// ── Thumbnails ───────────────────────────────────────────────────

#[tokio::test]
async fn subset_thumbnail_comes_from_last_version() {
    let con = RecordingConnection::new().respond(project_data(
        "versions",
        edges(vec![json!({"id": "V3", "version": 3, "subsetId": "s1", "thumbnailId": "t9"})]),
    ));

    let thumbnail = get_thumbnail_id_from_source(&con, "proj1", "subset", "s1")
        .await
        .unwrap();
    assert_eq!(thumbnail.as_deref(), Some("t9"));
    assert_eq!(con.requests()[0].variables["latestOnly"], json!(true));
}

#[tokio::test]
async fn unknown_thumbnail_source_returns_none() {
    let con = RecordingConnection::new();
    let thumbnail = get_thumbnail_id_from_source(&con, "proj1", "workfile", "w1")
        .await
        .unwrap();
    assert!(thumbnail.is_none());
    assert!(con.untouched());
}
