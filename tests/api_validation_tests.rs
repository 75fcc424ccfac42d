//! 请求校验集成测试：路径参数、空白名称、提取顺序、楼宇迁移

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::{ids_of, TestApp};

#[tokio::test]
async fn test_malformed_id_returns_json_400() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;

    let (status, json) = app.get("/api/properties/not-a-uuid", &acme.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "id: must be a valid id");

    let (status, json) = app
        .put("/api/zones/42", &acme.token, json!({ "name": "Lobby" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "id: must be a valid id");

    let (status, json) = app.delete("/api/user/staff/nope", &acme.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "staff_id: must be a valid id");
}

#[tokio::test]
async fn test_blank_names_are_rejected() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;

    let (status, json) = app
        .post("/api/user/properties", &acme.token, json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "name: must not be blank");

    let (_, json) = app.get("/api/user/properties", &acme.token).await;
    assert!(ids_of(&json).is_empty());

    let (status, _) = app
        .post("/api/user/departments", &acme.token, json!({ "name": "\t\n" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 更新同样适用
    let site = app.seed_site(&acme, "North", 1).await;
    let (status, json) = app
        .put(
            &format!("/api/zones/{}", site.zone_ids[0]),
            &acme.token,
            json!({ "name": "  " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "name: must not be blank");

    let (_, json) = app
        .get(&format!("/api/zones/{}", site.zone_ids[0]), &acme.token)
        .await;
    assert_eq!(json["name"], "North zone 0");
}

#[tokio::test]
async fn test_session_checked_before_body_validation() {
    let app = TestApp::new();

    let (status, json) = app
        .send(
            Method::POST,
            "/api/user/properties",
            None,
            Some(json!({ "name": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Unauthorized");
}

#[tokio::test]
async fn test_body_validation_precedes_role_policy() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let guard = app.invite_staff(&acme, "guard@acme.io").await;

    // 员工无权创建物业，但非法请求体先得到 400
    let (status, json) = app
        .post("/api/user/properties", &guard.token, json!({ "name": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("name:"));

    let (status, _) = app
        .post("/api/user/properties", &guard.token, json!({ "name": "Annex" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_building_with_zones_cannot_change_property() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let north = app.seed_site(&acme, "North", 2).await;
    let south = app.seed_site(&acme, "South", 0).await;

    let (status, json) = app
        .put(
            &format!("/api/buildings/{}", north.building_id),
            &acme.token,
            json!({ "property_id": south.property_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("zones"));

    let (_, building) = app
        .get(&format!("/api/buildings/{}", north.building_id), &acme.token)
        .await;
    assert_eq!(building["property_id"], north.property_id.to_string());

    for zone_id in &north.zone_ids {
        let (_, zone) = app.get(&format!("/api/zones/{}", zone_id), &acme.token).await;
        assert_eq!(zone["property_id"], north.property_id.to_string());
        assert_eq!(zone["building_id"], north.building_id.to_string());
    }
}

#[tokio::test]
async fn test_empty_building_moves_between_properties() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let north = app.seed_site(&acme, "North", 0).await;
    let south = app.seed_site(&acme, "South", 0).await;

    let (status, json) = app
        .put(
            &format!("/api/buildings/{}", north.building_id),
            &acme.token,
            json!({ "property_id": south.property_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "move failed: {}", json);
    assert_eq!(json["property_id"], south.property_id.to_string());

    let (_, property) = app
        .get(&format!("/api/properties/{}", south.property_id), &acme.token)
        .await;
    assert_eq!(property["buildings"].as_array().unwrap().len(), 2);
}
