//! Pure merge of live registry data with the display cache.

use crate::display::{DisplayServer, make_display_server};
use crate::navigation::domain::AppPage;
use crate::server::domain::{ManagedServer, ManagementApiUrl, ManualServer, Server};

/// What one registry answered during startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SourceState<T> {
    /// The registry answered.
    Loaded(Vec<T>),
    /// The registry was queried and failed.
    Unreachable,
    /// The registry was not queried.
    Skipped,
}

impl<T> SourceState<T> {
    pub(super) fn servers(&self) -> &[T] {
        match self {
            Self::Loaded(servers) => servers,
            Self::Unreachable | Self::Skipped => &[],
        }
    }

    const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable)
    }
}

/// Startup outcome computed from the registries and the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Reconciled {
    pub(super) servers: Vec<DisplayServer>,
    pub(super) selected: Option<ManagementApiUrl>,
    pub(super) page: AppPage,
    /// Whether `servers` should overwrite the cache.
    pub(super) persist: bool,
}

pub(super) fn reconcile(
    manual: &SourceState<ManualServer>,
    managed: &SourceState<ManagedServer>,
    cached: Vec<DisplayServer>,
    last_displayed: Option<&ManagementApiUrl>,
) -> Reconciled {
    let mut servers: Vec<DisplayServer> = manual
        .servers()
        .iter()
        .cloned()
        .map(Server::from)
        .chain(managed.servers().iter().cloned().map(Server::from))
        .map(|server| make_display_server(&server))
        .collect();

    if servers.is_empty() {
        return from_cache(cached, last_displayed);
    }

    // Entries of a kind whose registry failed stay in the cache.
    let carried: Vec<DisplayServer> = cached
        .into_iter()
        .filter(|entry| {
            if entry.is_managed() {
                managed.is_unreachable()
            } else {
                manual.is_unreachable()
            }
        })
        .filter(|entry| !servers.iter().any(|live| live.id() == entry.id()))
        .collect();
    servers.extend(carried);

    if let Some(remembered) =
        last_displayed.and_then(|id| resolve_remembered(&servers, managed, id))
    {
        return Reconciled {
            page: AppPage::for_server(remembered),
            selected: Some(remembered.id().clone()),
            servers,
            persist: true,
        };
    }

    let newest_installing = managed
        .servers()
        .iter()
        .filter(|server| server.install_state().is_installing())
        .max_by_key(|server| server.created_at());
    if let Some(installing) = newest_installing {
        return Reconciled {
            selected: Some(installing.core().management_api_url().clone()),
            page: AppPage::ServerProgress,
            servers,
            persist: true,
        };
    }

    Reconciled {
        selected: servers.first().map(|first| first.id().clone()),
        page: AppPage::ServerView,
        servers,
        persist: true,
    }
}

fn from_cache(cached: Vec<DisplayServer>, last_displayed: Option<&ManagementApiUrl>) -> Reconciled {
    if cached.is_empty() {
        return Reconciled {
            servers: cached,
            selected: None,
            page: AppPage::Intro,
            persist: false,
        };
    }
    let selected = last_displayed
        .and_then(|id| find(&cached, id))
        .or_else(|| cached.first())
        .map(|entry| entry.id().clone());
    Reconciled {
        servers: cached,
        selected,
        page: AppPage::ServerView,
        persist: false,
    }
}

/// Resolves the remembered server, following a provisional URL to the host's
/// current URL once its install has published one.
fn resolve_remembered<'a>(
    servers: &'a [DisplayServer],
    managed: &SourceState<ManagedServer>,
    id: &ManagementApiUrl,
) -> Option<&'a DisplayServer> {
    if let Some(found) = find(servers, id) {
        return Some(found);
    }
    let host_id = id.pending_host_id()?;
    let current = managed
        .servers()
        .iter()
        .find(|server| server.host_id() == host_id)?;
    find(servers, current.core().management_api_url())
}

fn find<'a>(servers: &'a [DisplayServer], id: &ManagementApiUrl) -> Option<&'a DisplayServer> {
    servers.iter().find(|server| server.id() == id)
}
