//! In-memory integration tests for startup reconciliation.

use super::helpers::{Harness, harness, manual_input};
use relaydeck::{
    display::{DISPLAY_SERVERS_KEY, DisplayServer, make_display_server},
    navigation::domain::AppPage,
    server::{
        domain::{ManagementApiUrl, ManualServer, ManualServerConfig, RegionId, Server},
        ports::ManualServerRegistry,
    },
    storage::ports::KeyValueStore,
};
use rstest::rstest;

fn ids(servers: &[DisplayServer]) -> Vec<&str> {
    servers.iter().map(|server| server.id().as_str()).collect()
}

async fn seed_manual(harness: &Harness, api_url: &str) -> eyre::Result<()> {
    harness
        .manual_registry()
        .add_server(ManualServerConfig::new(api_url, "AB:CD")?)
        .await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_system_starts_on_intro(harness: Harness) {
    let mut controller = harness.controller();

    let page = controller.start().await;

    assert_eq!(page, AppPage::Intro);
    assert!(controller.server_list().is_empty());
    assert!(controller.selected_server().is_none());
    assert_eq!(harness.view.snapshot().current_page, AppPage::Intro);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn corrupt_cache_reads_as_empty(harness: Harness) -> eyre::Result<()> {
    harness
        .store
        .set(DISPLAY_SERVERS_KEY, "{not a list")
        .await?;
    let mut controller = harness.controller();

    assert_eq!(controller.start().await, AppPage::Intro);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manual_and_managed_servers_are_merged_and_cached(
    harness: Harness,
) -> eyre::Result<()> {
    seed_manual(&harness, "https://manual.example:8080/api").await?;
    harness.store_token().await?;
    harness
        .seed_ready_managed("https://managed.example:8080/api")
        .await?;
    let mut controller = harness.controller();

    let page = controller.start().await;

    assert_eq!(page, AppPage::ServerView);
    assert_eq!(
        ids(controller.server_list()),
        vec![
            "https://manual.example:8080/api",
            "https://managed.example:8080/api"
        ]
    );
    let cached = harness.cache().list_servers().await;
    for server in controller.server_list() {
        assert!(cached.contains(server), "{} missing from cache", server.id());
    }
    assert_eq!(controller.tracked_install_count(), 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn managed_servers_are_skipped_without_a_token(harness: Harness) -> eyre::Result<()> {
    harness
        .seed_ready_managed("https://managed.example:8080/api")
        .await?;
    let mut controller = harness.controller();

    assert_eq!(controller.start().await, AppPage::Intro);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cache_is_shown_when_registries_are_empty_or_unreachable(
    harness: Harness,
) -> eyre::Result<()> {
    let cached: Vec<DisplayServer> = ["https://a.example", "https://b.example", "https://c.example"]
        .into_iter()
        .map(|url| {
            ManualServerConfig::new(url, "AB:CD")
                .map(|config| make_display_server(&Server::from(ManualServer::new(config))))
        })
        .collect::<Result<_, _>>()?;
    harness.cache().store_servers(&cached).await?;
    harness.store_token().await?;
    harness.session.set_unreachable(true)?;
    let mut controller = harness.controller();

    let page = controller.start().await;

    assert_eq!(page, AppPage::ServerView);
    assert_eq!(controller.server_list(), cached.as_slice());
    assert_eq!(harness.cache().list_servers().await, cached);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn last_selected_server_is_restored(harness: Harness) -> eyre::Result<()> {
    let mut first_run = harness.controller();
    first_run.start().await;
    first_run
        .create_manual_server(&manual_input("https://one.example"))
        .await?;
    first_run
        .create_manual_server(&manual_input("https://two.example"))
        .await?;
    first_run
        .show_server(&ManagementApiUrl::new("https://one.example")?)
        .await?;
    drop(first_run);

    let mut controller = harness.controller();
    let page = controller.start().await;

    assert_eq!(page, AppPage::ServerView);
    let selected = controller
        .selected_server()
        .ok_or_else(|| eyre::eyre!("nothing selected"))?;
    assert_eq!(selected.id().as_str(), "https://one.example");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn installing_managed_server_lands_on_progress(harness: Harness) -> eyre::Result<()> {
    seed_manual(&harness, "https://manual.example").await?;
    harness.store_token().await?;
    let installing = harness.seed_managed("ams3").await?;
    let mut controller = harness.controller();

    let page = controller.start().await;

    assert_eq!(page, AppPage::ServerProgress);
    let selected = controller
        .selected_server()
        .ok_or_else(|| eyre::eyre!("nothing selected"))?;
    assert_eq!(
        selected.id(),
        &ManagementApiUrl::pending_host(installing.host_id())
    );
    assert!(selected.is_installing());
    assert_eq!(controller.tracked_install_count(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn live_data_replaces_a_larger_cache(harness: Harness) -> eyre::Result<()> {
    let mut first_run = harness.controller();
    first_run.start().await;
    first_run
        .create_manual_server(&manual_input("https://kept.example"))
        .await?;
    first_run
        .create_manual_server(&manual_input("https://removed.example"))
        .await?;
    drop(first_run);
    harness
        .manual_registry()
        .forget_server(&ManagementApiUrl::new("https://removed.example")?)
        .await?;

    let mut controller = harness.controller();
    controller.start().await;

    assert_eq!(ids(controller.server_list()), vec!["https://kept.example"]);
    assert_eq!(
        ids(&harness.cache().list_servers().await),
        vec!["https://kept.example"]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_cloud_keeps_cached_managed_servers(harness: Harness) -> eyre::Result<()> {
    seed_manual(&harness, "https://manual.example").await?;
    harness.store_token().await?;
    harness
        .seed_ready_managed("https://managed.example")
        .await?;
    harness.controller().start().await;
    harness.session.set_unreachable(true)?;

    let mut controller = harness.controller();
    controller.start().await;

    assert_eq!(
        ids(controller.server_list()),
        vec!["https://manual.example", "https://managed.example"]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_carried_managed_server_removes_it(harness: Harness) -> eyre::Result<()> {
    seed_manual(&harness, "https://manual.example").await?;
    harness.store_token().await?;
    let host_id = harness
        .seed_ready_managed("https://managed.example")
        .await?;
    harness.controller().start().await;
    harness.session.set_unreachable(true)?;
    let mut controller = harness.controller();
    controller.start().await;
    harness.session.set_unreachable(false)?;

    controller.delete_managed_server(host_id).await?;

    assert_eq!(ids(controller.server_list()), vec!["https://manual.example"]);
    assert_eq!(
        ids(&harness.cache().list_servers().await),
        vec!["https://manual.example"]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn install_finished_while_closed_keeps_the_selection(
    harness: Harness,
) -> eyre::Result<()> {
    seed_manual(&harness, "https://manual.example").await?;
    harness.store_token().await?;
    let mut first_run = harness.controller();
    first_run.start().await;
    let region = RegionId::new("lon1")?;
    let pending = first_run.create_managed_server(&region).await?;
    let host_id = pending
        .id()
        .pending_host_id()
        .ok_or_else(|| eyre::eyre!("new host has no pending id"))?;
    drop(first_run);
    harness
        .session
        .complete_install(host_id, "https://finished.example")?;

    let mut controller = harness.controller();
    let page = controller.start().await;

    assert_eq!(page, AppPage::ServerView);
    let selected = controller
        .selected_server()
        .ok_or_else(|| eyre::eyre!("nothing selected"))?;
    assert_eq!(selected.id().as_str(), "https://finished.example");
    Ok(())
}
