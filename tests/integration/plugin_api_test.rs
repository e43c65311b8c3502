//! Integration tests for the plugin registry endpoints.

mod helpers;

use std::sync::atomic::Ordering;

use http::StatusCode;
use serde_json::json;

use modhub_database::PluginRepository;

#[tokio::test]
async fn test_list_plugins() {
    let app = helpers::TestApp::new();
    app.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo", "name": "SEO"}));
    app.add_plugin("blog", json!({"alias": "blog", "namespace": "Acme\\Blog", "autoload": "classmap"}));
    app.add_plugin("broken", json!({"alias": "broken"}));

    let response = app.request("GET", "/api/plugins").await;

    assert_eq!(response.status, StatusCode::OK);
    let plugins = response.body["data"]["plugins"].as_array().unwrap();
    let aliases: Vec<_> = plugins.iter().map(|p| p["alias"].as_str().unwrap()).collect();
    assert_eq!(aliases, vec!["blog", "seo"]);
    assert_eq!(plugins[0]["autoload"], "classmap");
    assert_eq!(plugins[1]["enabled"], false);
    assert!(plugins[1]["id"].is_string());
    assert_eq!(response.body["data"]["persisted"], true);
}

#[tokio::test]
async fn test_get_unknown_plugin_is_404() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/plugins/ghost").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
    assert_eq!(response.body["message"], "Plugin not found: ghost");
}

#[tokio::test]
async fn test_enable_and_disable_via_status() {
    let app = helpers::TestApp::new();
    app.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));

    let response = app.request("POST", "/api/plugins/seo/status/1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["enabled"], true);
    assert_eq!(response.body["data"]["autoload"]["change"], "added");
    assert_eq!(response.body["data"]["autoload_refreshed"], true);
    assert_eq!(
        app.composer()["autoload"]["psr-4"]["Acme\\Seo\\"],
        "plugins/seo/src"
    );

    let response = app.request("GET", "/api/plugins/seo").await;
    assert_eq!(response.body["data"]["enabled"], true);

    let response = app.request("POST", "/api/plugins/seo/status/0").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["autoload"]["change"], "removed");
    assert!(app.composer()["autoload"]["psr-4"].get("Acme\\Seo\\").is_none());
    assert!(!app.repo.find_by_alias("seo").await.unwrap().unwrap().enabled);

    let calls = app.runner.calls.lock().await;
    assert_eq!(*calls, vec!["composer dump-autoload", "composer dump-autoload"]);
}

#[tokio::test]
async fn test_enable_unknown_plugin_leaves_manifest() {
    let app = helpers::TestApp::new();
    let before = app.composer_text();

    let response = app.request("POST", "/api/plugins/ghost/status/1").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.composer_text(), before);
    assert!(app.runner.calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_invalid_status_is_rejected() {
    let app = helpers::TestApp::new();
    app.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));

    let response = app.request("POST", "/api/plugins/seo/status/maybe").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_install_and_uninstall() {
    let app = helpers::TestApp::new();
    app.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo", "version": "3.1.0"}));

    let response = app.request("POST", "/api/plugins/seo/install").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["message"], "Installed plugin dependencies");
    let record = app.repo.find_by_alias("seo").await.unwrap().unwrap();
    assert!(record.installed);
    assert_eq!(record.installed_version.as_deref(), Some("3.1.0"));

    let response = app.request("POST", "/api/plugins/seo/uninstall").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["message"], "Uninstalled plugin dependencies");
    assert!(!app.repo.find_by_alias("seo").await.unwrap().unwrap().installed);

    let calls = app.runner.calls.lock().await;
    assert_eq!(
        *calls,
        vec!["php artisan module:install seo", "php artisan module:uninstall seo"]
    );
}

#[tokio::test]
async fn test_install_unknown_plugin() {
    let app = helpers::TestApp::new();

    let response = app.request("POST", "/api/plugins/ghost/install").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Plugin not exists");
    assert!(app.runner.calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_failed_install_command() {
    let app = helpers::TestApp::new();
    app.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
    app.runner.exit_code.store(1, Ordering::SeqCst);

    let response = app.request("POST", "/api/plugins/seo/install").await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "EXTERNAL_SERVICE_ERROR");
    assert!(!app.repo.find_by_alias("seo").await.unwrap().unwrap().installed);
}

#[tokio::test]
async fn test_refresh_picks_up_new_plugins() {
    let app = helpers::TestApp::new();
    app.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));

    let response = app.request("GET", "/api/plugins").await;
    assert_eq!(response.body["data"]["plugins"].as_array().unwrap().len(), 1);

    app.add_plugin("shop", json!({"alias": "shop", "namespace": "Acme\\Shop"}));
    let response = app.request("GET", "/api/plugins").await;
    assert_eq!(response.body["data"]["plugins"].as_array().unwrap().len(), 1);

    let response = app.request("POST", "/api/plugins/refresh").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["plugins"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_namespace_reported_as_conflict() {
    let app = helpers::TestApp::new();
    app.add_plugin("a-seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
    app.add_plugin("b-seo-fork", json!({"alias": "seo-fork", "namespace": "Acme\\Seo"}));

    let response = app.request("GET", "/api/plugins").await;

    assert_eq!(response.body["data"]["plugins"].as_array().unwrap().len(), 1);
    let conflicts = response.body["data"]["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["kind"], "namespace");
}

#[tokio::test]
async fn test_degraded_mode_without_backend() {
    let app = helpers::TestApp::new();
    app.add_plugin("seo", json!({"alias": "seo", "namespace": "Acme\\Seo"}));
    app.repo.set_ready(false);
    let before = app.composer_text();

    let response = app.request("GET", "/api/plugins").await;
    assert_eq!(response.body["data"]["persisted"], false);
    assert!(response.body["data"]["plugins"][0]["id"].is_null());

    let response = app.request("POST", "/api/plugins/seo/status/1").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.composer_text(), before);
}
