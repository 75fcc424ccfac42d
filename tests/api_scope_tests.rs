//! 租户隔离集成测试

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

mod common;
use common::{ids_of, TestApp};

#[tokio::test]
async fn test_owner_sees_only_own_properties_with_buildings() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let globex = app.register_owner("owner@globex.io", "Globex").await;
    let globex_staff = app.invite_staff(&globex, "guard@globex.io").await;

    let first = app.seed_site(&acme, "North", 4).await;
    let second = app.seed_site(&acme, "South", 4).await;
    app.seed_site(&globex, "Harbor", 1).await;

    let (status, json) = app.get("/api/user/properties", &acme.token).await;
    assert_eq!(status, StatusCode::OK);

    let properties = json.as_array().unwrap();
    assert_eq!(properties.len(), 2);
    for property in properties {
        let buildings = property["buildings"].as_array().unwrap();
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0]["property_id"], property["id"]);
    }
    let ids = ids_of(&json);
    assert!(ids.contains(&first.property_id));
    assert!(ids.contains(&second.property_id));

    // 其他业务的员工看不到这些物业
    let (status, json) = app.get("/api/user/properties", &globex_staff.token).await;
    assert_eq!(status, StatusCode::OK);
    let ids = ids_of(&json);
    assert_eq!(ids.len(), 1);
    assert!(!ids.contains(&first.property_id));
    assert!(!ids.contains(&second.property_id));
}

#[tokio::test]
async fn test_every_scoped_list_is_filtered() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let globex = app.register_owner("owner@globex.io", "Globex").await;

    for owner in [&acme, &globex] {
        let site = app.seed_site(owner, "Site", 2).await;
        app.create(
            "/api/user/cameras",
            &owner.token,
            json!({ "zone_id": site.zone_ids[0], "name": "Gate", "stream_url": "rtsp://10.0.0.2/live" }),
        )
        .await;
        app.create("/api/user/departments", &owner.token, json!({ "name": "Security" }))
            .await;
        app.create(
            "/api/user/alert-rule",
            &owner.token,
            json!({ "name": "Night motion", "trigger": "MOTION" }),
        )
        .await;
        app.create(
            "/api/user/notes",
            &owner.token,
            json!({ "property_id": site.property_id, "content": "Gate code changed" }),
        )
        .await;
        app.create("/api/user/vt-credentials", &owner.token, json!({ "label": "gateway" }))
            .await;
    }

    let expected = [
        ("/api/user/properties", 1),
        ("/api/user/buildings", 1),
        ("/api/user/zones", 2),
        ("/api/user/cameras", 1),
        ("/api/user/departments", 1),
        ("/api/user/alert-rule", 1),
        ("/api/user/notes", 1),
        ("/api/user/vt-credentials", 1),
    ];

    for (uri, count) in expected {
        let (status, json) = app.get(uri, &acme.token).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(json.as_array().unwrap().len(), count, "{}", uri);
        for row in json.as_array().unwrap() {
            if let Some(business_id) = row.get("business_id") {
                assert_eq!(business_id, &json!(acme.business_id), "{}", uri);
            }
        }
    }
}

#[tokio::test]
async fn test_staff_share_scope_but_cannot_create_owner_only_kinds() {
    let app = TestApp::new();
    let owner = app.register_owner("owner@acme.io", "Acme").await;
    let staff = app.invite_staff(&owner, "guard@acme.io").await;
    let site = app.seed_site(&owner, "North", 1).await;

    let (status, json) = app.get("/api/user/properties", &staff.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids_of(&json), vec![site.property_id]);

    let (status, json) = app
        .post("/api/user/properties", &staff.token, json!({ "name": "Rogue" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json["error"].is_string());

    let (status, _) = app
        .post("/api/user/departments", &staff.token, json!({ "name": "Rogue" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 员工可以管理区域和摄像头
    app.create(
        "/api/user/zones",
        &staff.token,
        json!({ "property_id": site.property_id, "name": "Loading dock" }),
    )
    .await;
    app.create(
        "/api/user/cameras",
        &staff.token,
        json!({ "zone_id": site.zone_ids[0], "name": "Dock cam", "stream_url": "rtsp://10.0.0.9/live" }),
    )
    .await;

    // 物业不能被员工修改或删除
    let uri = format!("/api/properties/{}", site.property_id);
    let (status, _) = app.put(&uri, &staff.token, json!({ "name": "Renamed" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, &staff.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_foreign_ids_are_not_found() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let globex = app.register_owner("owner@globex.io", "Globex").await;
    let site = app.seed_site(&globex, "Harbor", 1).await;

    let property_uri = format!("/api/properties/{}", site.property_id);
    let (status, json) = app.get(&property_uri, &acme.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({ "error": "Property not found" }));

    let (status, _) = app
        .put(&property_uri, &acme.token, json!({ "name": "Hijacked" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&property_uri, &acme.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let zone_uri = format!("/api/zones/{}", site.zone_ids[0]);
    let (status, _) = app.get(&zone_uri, &acme.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 不能在外部业务的父资源下创建子资源
    let (status, _) = app
        .post(
            "/api/user/buildings",
            &acme.token,
            json!({ "property_id": site.property_id, "name": "Annex" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 原数据不受影响
    let (status, json) = app.get(&property_uri, &globex.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Harbor");
}

#[tokio::test]
async fn test_moving_camera_to_foreign_zone_is_rejected() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let globex = app.register_owner("owner@globex.io", "Globex").await;
    let own = app.seed_site(&acme, "North", 1).await;
    let foreign = app.seed_site(&globex, "Harbor", 1).await;

    let camera_id = app
        .create(
            "/api/user/cameras",
            &acme.token,
            json!({ "zone_id": own.zone_ids[0], "name": "Gate", "stream_url": "rtsp://10.0.0.2/live" }),
        )
        .await;

    let uri = format!("/api/cameras/{}", camera_id);
    let (status, _) = app
        .put(&uri, &acme.token, json!({ "zone_id": foreign.zone_ids[0] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = app.get(&uri, &acme.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["zone_id"], json!(own.zone_ids[0]));
}

#[tokio::test]
async fn test_owner_cannot_target_another_business() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let globex = app.register_owner("owner@globex.io", "Globex").await;

    let (status, _) = app
        .post(
            "/api/user/properties",
            &acme.token,
            json!({ "business_id": globex.business_id, "name": "Sneaky" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, json) = app.get("/api/user/properties", &globex.token).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unassigned_staff_sees_nothing_and_cannot_create() {
    let app = TestApp::new();
    let owner = app.register_owner("owner@acme.io", "Acme").await;
    let staff = app.invite_staff(&owner, "guard@acme.io").await;
    let site = app.seed_site(&owner, "North", 1).await;

    let (status, _) = app
        .delete(&format!("/api/user/staff/{}", staff.staff_id), &owner.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // 作用域每个请求重新解析，旧令牌立即失去访问
    let (status, json) = app.get("/api/user/properties", &staff.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());

    let (status, _) = app
        .get(&format!("/api/properties/{}", site.property_id), &staff.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/user/zones",
            &staff.token,
            json!({ "property_id": site.property_id, "name": "Orphan" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app.get("/api/user/dashboard", &staff.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["properties"], 0);
    assert_eq!(json["staff"], 0);
}

#[tokio::test]
async fn test_admin_bypasses_scope_and_must_name_business() {
    let app = TestApp::new();
    let acme = app.register_owner("owner@acme.io", "Acme").await;
    let globex = app.register_owner("owner@globex.io", "Globex").await;
    app.seed_site(&acme, "North", 1).await;
    app.seed_site(&globex, "Harbor", 1).await;
    let admin = app.create_admin("root@visiontrack.io").await;

    let (status, json) = app.get("/api/user/properties", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (status, json) = app
        .post("/api/user/properties", &admin, json!({ "name": "Unowned" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("business_id:"));

    let (status, _) = app
        .post(
            "/api/user/properties",
            &admin,
            json!({ "business_id": Uuid::new_v4(), "name": "Ghost" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let property_id = app
        .create(
            "/api/user/properties",
            &admin,
            json!({ "business_id": acme.business_id, "name": "Placed by admin" }),
        )
        .await;

    let (_, json) = app.get("/api/user/properties", &acme.token).await;
    assert!(ids_of(&json).contains(&property_id));
}

#[tokio::test]
async fn test_zone_building_must_share_property() {
    let app = TestApp::new();
    let owner = app.register_owner("owner@acme.io", "Acme").await;
    let north = app.seed_site(&owner, "North", 0).await;
    let south = app.seed_site(&owner, "South", 0).await;

    let (status, json) = app
        .post(
            "/api/user/zones",
            &owner.token,
            json!({
                "property_id": north.property_id,
                "building_id": south.building_id,
                "name": "Mismatched",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("building_id:"));
}

#[tokio::test]
async fn test_property_delete_cascades_to_children() {
    let app = TestApp::new();
    let owner = app.register_owner("owner@acme.io", "Acme").await;
    let site = app.seed_site(&owner, "North", 2).await;
    app.create(
        "/api/user/cameras",
        &owner.token,
        json!({ "zone_id": site.zone_ids[0], "name": "Gate", "stream_url": "rtsp://10.0.0.2/live" }),
    )
    .await;

    let (status, json) = app
        .delete(&format!("/api/properties/{}", site.property_id), &owner.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(json.is_null());

    for uri in ["/api/user/buildings", "/api/user/zones", "/api/user/cameras"] {
        let (_, json) = app.get(uri, &owner.token).await;
        assert!(json.as_array().unwrap().is_empty(), "{}", uri);
    }
}
