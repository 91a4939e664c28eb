//! Then steps for navigation BDD scenarios.

use super::world::NavigationWorld;
use relaydeck::navigation::services::NavigationError;
use rstest_bdd_macros::then;

#[then(r#"the current page is "{page}""#)]
fn current_page_is(world: &NavigationWorld, page: String) -> Result<(), eyre::Report> {
    let current = world.controller.current_page();
    eyre::ensure!(
        current.as_str() == page,
        "expected page {page}, found {current}"
    );
    let rendered = world.view.snapshot().current_page;
    eyre::ensure!(
        rendered == current,
        "view shows {rendered}, controller is on {current}"
    );
    Ok(())
}

#[then("the server list has {count:u64} servers")]
fn server_list_has(world: &NavigationWorld, count: u64) -> Result<(), eyre::Report> {
    let listed = u64::try_from(world.controller.server_list().len())?;
    eyre::ensure!(listed == count, "expected {count} servers, found {listed}");
    Ok(())
}

#[then(r#"the selected server is "{api_url}""#)]
fn selected_server_is(world: &NavigationWorld, api_url: String) -> Result<(), eyre::Report> {
    let selected = world
        .controller
        .selected_server()
        .ok_or_else(|| eyre::eyre!("no server is selected"))?;
    eyre::ensure!(
        selected.id().as_str() == api_url,
        "expected {api_url} selected, found {}",
        selected.id()
    );
    Ok(())
}

#[then("the selected server is installing")]
fn selected_server_is_installing(world: &NavigationWorld) -> Result<(), eyre::Report> {
    let selected = world
        .controller
        .selected_server()
        .ok_or_else(|| eyre::eyre!("no server is selected"))?;
    eyre::ensure!(
        selected.is_installing(),
        "{} is not installing",
        selected.id()
    );
    Ok(())
}

#[then("the operation fails with a validation error")]
fn operation_fails_with_validation_error(world: &NavigationWorld) -> Result<(), eyre::Report> {
    let error = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation error"))?;
    if !matches!(error, NavigationError::Validation(_)) {
        return Err(eyre::eyre!("expected validation error, got {error:?}"));
    }
    Ok(())
}

#[then(r#"an error banner mentions "{text}""#)]
fn error_banner_mentions(world: &NavigationWorld, text: String) -> Result<(), eyre::Report> {
    let banner = world
        .controller
        .error_banner()
        .ok_or_else(|| eyre::eyre!("no error banner is shown"))?;
    eyre::ensure!(
        banner.message.contains(&text),
        "banner {:?} does not mention {text}",
        banner.message
    );
    Ok(())
}
