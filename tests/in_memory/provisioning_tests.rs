//! In-memory integration tests for managed server provisioning.

use super::helpers::{Harness, harness, manual_input, next_update};
use relaydeck::{
    display::DisplayInstallState,
    navigation::{
        config::NavigationConfig,
        domain::AppPage,
        services::{NavigationError, ProvisioningNotice},
    },
    server::{
        domain::{HostId, ManagementApiUrl, RegionId},
        services::ProvisioningConfig,
    },
};
use rstest::rstest;
use std::time::Duration;

fn region(slug: &str) -> RegionId {
    RegionId::new(slug).expect("valid region")
}

fn host_of(id: &ManagementApiUrl) -> eyre::Result<HostId> {
    let raw = id
        .as_str()
        .rsplit('/')
        .next()
        .ok_or_else(|| eyre::eyre!("no host segment in {id}"))?;
    Ok(HostId::new(raw.parse()?))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn managed_creation_needs_a_cloud_account(harness: Harness) {
    let mut controller = harness.controller();
    controller.start().await;

    let result = controller.create_managed_server(&region("nyc1")).await;

    assert!(matches!(result, Err(NavigationError::CloudAccountRequired)));
    assert_eq!(harness.session.droplet_count().expect("count"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsupported_region_is_rejected(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let mut controller = harness.controller();
    controller.start().await;

    let result = controller.create_managed_server(&region("lon1")).await;

    assert!(matches!(result, Err(NavigationError::ManagedRegistry(_))));
    assert_eq!(controller.current_page(), AppPage::Intro);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creation_shows_progress_then_server(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let mut controller = harness.controller();
    controller.start().await;

    let pending = controller.create_managed_server(&region("nyc3")).await?;

    assert_eq!(controller.current_page(), AppPage::ServerProgress);
    assert_eq!(harness.view.snapshot().current_page, AppPage::ServerProgress);
    assert!(pending.is_managed());
    assert_eq!(pending.install_state(), DisplayInstallState::Installing);
    assert!(pending.id().is_pending());

    let host_id = host_of(pending.id())?;
    harness.session.report_progress(host_id, 40)?;
    harness
        .session
        .complete_install(host_id, "https://198.51.100.4:9000/secret")?;
    let notice = next_update(&mut controller).await?;

    let ProvisioningNotice::Ready(ready) = notice else {
        return Err(eyre::eyre!("expected ready notice, got {notice:?}"));
    };
    assert_eq!(ready.id().as_str(), "https://198.51.100.4:9000/secret");
    assert_eq!(ready.install_state(), DisplayInstallState::Ready);
    assert_eq!(controller.current_page(), AppPage::ServerView);
    assert_eq!(controller.server_list(), &[ready.clone()]);
    assert_eq!(controller.selected_server(), Some(&ready));
    assert_eq!(harness.cache().list_servers().await, vec![ready.clone()]);
    assert_eq!(
        harness.cache().last_displayed_server_id().await,
        Some(ready.id().clone())
    );
    assert_eq!(controller.tracked_install_count(), 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_entry_keeps_its_list_position(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let mut controller = harness.controller();
    controller.start().await;
    let pending = controller.create_managed_server(&region("nyc1")).await?;
    let manual = controller
        .create_manual_server(&manual_input("https://manual.example"))
        .await?;

    harness
        .session
        .complete_install(host_of(pending.id())?, "https://ready.example")?;
    next_update(&mut controller).await?;

    let ids: Vec<&str> = controller
        .server_list()
        .iter()
        .map(|server| server.id().as_str())
        .collect();
    assert_eq!(ids, vec!["https://ready.example", "https://manual.example"]);
    // Navigating away does not cancel the waiter, nor does completion steal
    // the selection.
    assert_eq!(controller.selected_server(), Some(&manual));
    assert_eq!(controller.current_page(), AppPage::ServerView);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_install_shows_a_banner_on_progress(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let mut controller = harness.controller();
    controller.start().await;
    let pending = controller.create_managed_server(&region("sgp1")).await?;
    let host_id = host_of(pending.id())?;

    harness.session.fail_install(host_id, "docker pull failed")?;
    let notice = next_update(&mut controller).await?;

    let ProvisioningNotice::Failed(banner) = notice else {
        return Err(eyre::eyre!("expected failure notice, got {notice:?}"));
    };
    assert_eq!(banner.host_id, host_id);
    assert!(banner.message.contains("docker pull failed"));
    assert_eq!(controller.current_page(), AppPage::ServerProgress);
    assert_eq!(controller.error_banner(), Some(&banner));
    assert_eq!(harness.view.snapshot().error_banner, Some(banner));
    assert_eq!(controller.tracked_install_count(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retry_after_timeout_picks_up_completion(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let config = NavigationConfig {
        provisioning: ProvisioningConfig {
            poll_interval: Duration::from_millis(5),
            progress_timeout: Duration::from_millis(30),
        },
        reset_timeout_on_progress: true,
    };
    let mut controller = harness.controller_with(config);
    controller.start().await;
    let pending = controller.create_managed_server(&region("nyc1")).await?;
    let host_id = host_of(pending.id())?;

    let timed_out = next_update(&mut controller).await?;
    assert!(matches!(timed_out, ProvisioningNotice::Failed(_)));
    assert!(controller.error_banner().is_some());

    harness
        .session
        .complete_install(host_id, "https://late.example")?;
    controller.retry_provisioning(host_id)?;
    assert!(controller.error_banner().is_none());

    let notice = next_update(&mut controller).await?;
    assert!(matches!(notice, ProvisioningNotice::Ready(_)));
    assert_eq!(controller.current_page(), AppPage::ServerView);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retry_requires_a_failure(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let mut controller = harness.controller();
    controller.start().await;
    let pending = controller.create_managed_server(&region("nyc1")).await?;

    let result = controller.retry_provisioning(host_of(pending.id())?);

    assert!(matches!(result, Err(NavigationError::NothingToRetry(_))));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_host_results_are_ignored(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let mut controller = harness.controller();
    controller.start().await;
    let pending = controller.create_managed_server(&region("ams3")).await?;
    let host_id = host_of(pending.id())?;

    controller.delete_managed_server(host_id).await?;
    let notice = next_update(&mut controller).await?;

    assert_eq!(notice, ProvisioningNotice::Ignored(host_id));
    assert!(controller.server_list().is_empty());
    assert_eq!(controller.current_page(), AppPage::Intro);
    assert!(harness.cache().list_servers().await.is_empty());
    assert_eq!(harness.session.droplet_count()?, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_reattaches_a_waiter(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let mut first_run = harness.controller();
    first_run.start().await;
    let pending = first_run.create_managed_server(&region("nyc1")).await?;
    drop(first_run);

    let mut controller = harness.controller();
    assert_eq!(controller.start().await, AppPage::ServerProgress);
    harness
        .session
        .complete_install(host_of(pending.id())?, "https://after-restart.example")?;
    let notice = next_update(&mut controller).await?;

    assert!(matches!(notice, ProvisioningNotice::Ready(_)));
    assert_eq!(controller.current_page(), AppPage::ServerView);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pending_updates_are_applied_in_bulk(harness: Harness) -> eyre::Result<()> {
    harness.store_token().await?;
    let mut controller = harness.controller();
    controller.start().await;
    let first = controller.create_managed_server(&region("nyc1")).await?;
    let second = controller.create_managed_server(&region("ams3")).await?;
    harness
        .session
        .fail_install(host_of(first.id())?, "first failed")?;
    harness
        .session
        .fail_install(host_of(second.id())?, "second failed")?;

    let mut notices = Vec::new();
    for _ in 0..200 {
        notices.extend(controller.apply_pending_updates().await);
        if notices.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(notices.len(), 2);
    assert!(
        notices
            .iter()
            .all(|notice| matches!(notice, ProvisioningNotice::Failed(_)))
    );
    Ok(())
}
