//! HTTP client for a launcher server plus the session state a grid front end
//! keeps around it.
//!
//! [`LauncherClient`] caches the last list it fetched. Every successful
//! mutation drops that cache so the next read goes back to the server; a
//! failed mutation leaves it alone, so a view may be stale until the next
//! successful read.

use launcher_common::view::{CategoryFilter, LauncherView, ViewQuery, derive_view, reorder_on_drop};
use launcher_common::{Entry, NewEntry, PositionUpdate};
use reqwest::Response;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::api::ACCESS_CODE_FIELD;
use crate::errors::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct LauncherClient {
    http: reqwest::Client,
    base: Url,
    cache: Option<Vec<Entry>>,
}

impl LauncherClient {
    /// `base` is the server root, e.g. `http://127.0.0.1:5000`.
    pub fn new(base: &str) -> Result<Self, ClientError> {
        Self::with_http(base, reqwest::Client::new())
    }

    pub fn with_http(base: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self {
            http,
            base,
            cache: None,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Turn a non-success response into `ClientError::Status` carrying the
    /// server's `error` message.
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        Err(ClientError::Status { status, message })
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        let response = self.http.get(self.endpoint(&["health"])?).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// The cached list, fetching it first if nothing is cached.
    pub async fn entries(&mut self) -> Result<&[Entry], ClientError> {
        if self.cache.is_none() {
            return self.refresh().await;
        }
        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Always hits the server and replaces the cache.
    pub async fn refresh(&mut self) -> Result<&[Entry], ClientError> {
        let response = self.http.get(self.endpoint(&["api", "apps"])?).send().await?;
        let entries: Vec<Entry> = Self::check(response).await?.json().await?;
        tracing::debug!(count = entries.len(), "Fetched apps");
        Ok(self.cache.insert(entries).as_slice())
    }

    pub async fn create(
        &mut self,
        new: &NewEntry,
        access_code: Option<&str>,
    ) -> Result<Entry, ClientError> {
        let mut body = serde_json::json!({
            "name": new.name,
            "url": new.url,
            "category": new.category,
        });
        if let (Some(code), Some(fields)) = (access_code, body.as_object_mut()) {
            fields.insert(ACCESS_CODE_FIELD.to_string(), Value::String(code.to_string()));
        }
        let response = self
            .http
            .post(self.endpoint(&["api", "apps"])?)
            .json(&body)
            .send()
            .await?;
        let entry: Entry = Self::check(response).await?.json().await?;
        self.invalidate();
        Ok(entry)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.endpoint(&["api", "apps", id])?)
            .send()
            .await?;
        Self::check(response).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn reorder(&mut self, updates: &[PositionUpdate]) -> Result<(), ClientError> {
        let response = self
            .http
            .patch(self.endpoint(&["api", "apps", "positions"])?)
            .json(updates)
            .send()
            .await?;
        Self::check(response).await?;
        self.invalidate();
        Ok(())
    }
}

/// User-facing outcome of a mutation. Failures never say more than which
/// action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AppAdded,
    AddFailed,
    AppDeleted,
    DeleteFailed,
    ReorderFailed,
}

impl Notice {
    pub fn title(self) -> &'static str {
        match self {
            Notice::AppAdded => "App added successfully",
            Notice::AddFailed => "Failed to add app",
            Notice::AppDeleted => "App deleted",
            Notice::DeleteFailed => "Failed to delete app",
            Notice::ReorderFailed => "Failed to reorder apps",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Notice::AppAdded => "Your app has been added to the launcher.",
            Notice::AddFailed => "There was an error adding your app. Please try again.",
            Notice::AppDeleted => "The app has been removed from your launcher.",
            Notice::DeleteFailed => "There was an error deleting the app. Please try again.",
            Notice::ReorderFailed => "There was an error saving the new order. Please try again.",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            Notice::AddFailed | Notice::DeleteFailed | Notice::ReorderFailed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// A filter is active, so the grid is not draggable.
    DragDisabled,
    /// Dropped on itself or on an id that is not in the list.
    Unchanged,
    Reordered,
    Failed,
}

/// Client-side state of one launcher page.
pub struct Session {
    client: LauncherClient,
    pub query: ViewQuery,
    pub draft: NewEntry,
    pub add_dialog_open: bool,
    pub pending_delete: Option<String>,
    notice: Option<Notice>,
    last_created: Option<Entry>,
}

impl Session {
    pub fn new(client: LauncherClient) -> Self {
        Self {
            client,
            query: ViewQuery::default(),
            draft: NewEntry::default(),
            add_dialog_open: false,
            pending_delete: None,
            notice: None,
            last_created: None,
        }
    }

    pub fn client(&mut self) -> &mut LauncherClient {
        &mut self.client
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    /// The entry returned by the most recent successful submit.
    pub fn last_created(&self) -> Option<&Entry> {
        self.last_created.as_ref()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.query.category = category;
    }

    pub fn open_add_dialog(&mut self) {
        self.add_dialog_open = true;
    }

    pub async fn view(&mut self) -> Result<LauncherView, ClientError> {
        let entries = self.client.entries().await?;
        Ok(derive_view(entries, &self.query))
    }

    /// Submit the add form. The draft and dialog are only reset on success.
    pub async fn submit_draft(&mut self, access_code: Option<&str>) -> Notice {
        let notice = match self.client.create(&self.draft, access_code).await {
            Ok(entry) => {
                tracing::debug!(entry_id = %entry.id, "Draft submitted");
                self.draft = NewEntry::default();
                self.add_dialog_open = false;
                self.last_created = Some(entry);
                Notice::AppAdded
            }
            Err(e) => {
                tracing::warn!(error = %e, "Create failed");
                Notice::AddFailed
            }
        };
        self.notice = Some(notice);
        notice
    }

    pub fn request_delete(&mut self, id: impl Into<String>) {
        self.pending_delete = Some(id.into());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the pending selection. Returns `None` if nothing is pending.
    pub async fn confirm_delete(&mut self) -> Option<Notice> {
        let id = self.pending_delete.clone()?;
        let notice = match self.client.delete(&id).await {
            Ok(()) => {
                self.pending_delete = None;
                Notice::AppDeleted
            }
            Err(e) => {
                tracing::warn!(entry_id = %id, error = %e, "Delete failed");
                Notice::DeleteFailed
            }
        };
        self.notice = Some(notice);
        Some(notice)
    }

    /// Drop the card `active_id` onto `over_id` and persist the new order.
    pub async fn drop_card(&mut self, active_id: &str, over_id: &str) -> DropOutcome {
        if !self.query.is_unfiltered() {
            return DropOutcome::DragDisabled;
        }
        let view = match self.view().await {
            Ok(view) => view,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load apps for reorder");
                self.notice = Some(Notice::ReorderFailed);
                return DropOutcome::Failed;
            }
        };
        let Some(updates) = reorder_on_drop(&view.entries, active_id, over_id) else {
            return DropOutcome::Unchanged;
        };
        match self.client.reorder(&updates).await {
            Ok(()) => DropOutcome::Reordered,
            Err(e) => {
                tracing::warn!(error = %e, "Reorder failed");
                self.notice = Some(Notice::ReorderFailed);
                DropOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::AccessPolicy;
    use crate::server::{LauncherServer, ServerConfig};

    /// Serve a fresh in-memory launcher on an ephemeral port.
    async fn spawn_server(access: AccessPolicy) -> String {
        let config = ServerConfig {
            port: 0,
            access,
            ..Default::default()
        };
        let server = LauncherServer::bind(config).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run_until(std::future::pending()));
        format!("http://{}", addr)
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let client = LauncherClient::new("http://localhost:5000").unwrap();
        assert_eq!(
            client.endpoint(&["api", "apps"]).unwrap().as_str(),
            "http://localhost:5000/api/apps"
        );
        let client = LauncherClient::new("http://localhost/launcher/").unwrap();
        assert_eq!(
            client.endpoint(&["api", "apps", "x y"]).unwrap().as_str(),
            "http://localhost/launcher/api/apps/x%20y"
        );
    }

    #[test]
    fn test_rejects_non_base_urls() {
        assert!(LauncherClient::new("mailto:me@example.com").is_err());
        assert!(LauncherClient::new("not a url").is_err());
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(Notice::AppAdded.title(), "App added successfully");
        assert!(!Notice::AppAdded.is_error());
        assert_eq!(Notice::DeleteFailed.title(), "Failed to delete app");
        assert!(Notice::ReorderFailed.is_error());
    }

    #[tokio::test]
    async fn test_cache_invalidated_on_mutation() {
        let base = spawn_server(AccessPolicy::Open).await;
        let mut client = LauncherClient::new(&base).unwrap();

        assert!(client.entries().await.unwrap().is_empty());
        assert!(client.is_cached());

        let created = client
            .create(&NewEntry::new("GitHub", "https://github.com"), None)
            .await
            .unwrap();
        assert!(!client.is_cached());
        assert_eq!(client.entries().await.unwrap(), &[created.clone()]);

        client.delete(&created.id).await.unwrap();
        assert!(!client.is_cached());
        assert!(client.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let base = spawn_server(AccessPolicy::Open).await;
        let mut client = LauncherClient::new(&base).unwrap();
        client.entries().await.unwrap();

        let err = client.delete("missing").await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("App not found"));
        assert!(client.is_cached());
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_server(AccessPolicy::Open).await;
        let client = LauncherClient::new(&base).unwrap();
        assert_eq!(client.health().await.unwrap().status, "ok");
    }

    #[tokio::test]
    async fn test_submit_draft_resets_only_on_success() {
        let base = spawn_server(AccessPolicy::gated(Some("secret".into()))).await;
        let mut session = Session::new(LauncherClient::new(&base).unwrap());
        session.open_add_dialog();
        session.draft = NewEntry::new("GitHub", "https://github.com");

        assert_eq!(session.submit_draft(Some("wrong")).await, Notice::AddFailed);
        assert!(session.add_dialog_open);
        assert_eq!(session.draft.name, "GitHub");

        assert_eq!(session.submit_draft(Some("secret")).await, Notice::AppAdded);
        assert!(!session.add_dialog_open);
        assert_eq!(session.draft, NewEntry::default());
        assert_eq!(session.last_created().unwrap().name, "GitHub");
        assert_eq!(session.view().await.unwrap().entries.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_delete_clears_selection_only_on_success() {
        let base = spawn_server(AccessPolicy::Open).await;
        let mut session = Session::new(LauncherClient::new(&base).unwrap());
        assert_eq!(session.confirm_delete().await, None);

        session.request_delete("missing");
        assert_eq!(session.confirm_delete().await, Some(Notice::DeleteFailed));
        assert_eq!(session.pending_delete.as_deref(), Some("missing"));

        let entry = session
            .client()
            .create(&NewEntry::new("A", "https://a.com"), None)
            .await
            .unwrap();
        session.request_delete(entry.id);
        assert_eq!(session.confirm_delete().await, Some(Notice::AppDeleted));
        assert!(session.pending_delete.is_none());
        assert_eq!(session.notice(), Some(Notice::AppDeleted));
    }

    #[tokio::test]
    async fn test_cancel_delete_keeps_entry() {
        let base = spawn_server(AccessPolicy::Open).await;
        let mut session = Session::new(LauncherClient::new(&base).unwrap());
        let entry = session
            .client()
            .create(&NewEntry::new("A", "https://a.com"), None)
            .await
            .unwrap();

        session.request_delete(entry.id.clone());
        session.cancel_delete();
        assert!(session.pending_delete.is_none());
        assert_eq!(session.confirm_delete().await, None);
        assert_eq!(session.view().await.unwrap().entries, vec![entry]);
    }

    #[tokio::test]
    async fn test_drop_card_reorders_densely() {
        let base = spawn_server(AccessPolicy::Open).await;
        let mut session = Session::new(LauncherClient::new(&base).unwrap());
        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            let entry = session
                .client()
                .create(&NewEntry::new(name, "https://example.com"), None)
                .await
                .unwrap();
            ids.push(entry.id);
        }
        // Give the stored order distinct positions first.
        let initial: Vec<PositionUpdate> = launcher_common::entry::dense_positions(
            ids.iter().map(String::as_str),
        );
        session.client().reorder(&initial).await.unwrap();

        assert_eq!(session.drop_card(&ids[2], &ids[0]).await, DropOutcome::Reordered);
        let names: Vec<String> = session
            .view()
            .await
            .unwrap()
            .entries
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_drop_card_disabled_under_filter() {
        let base = spawn_server(AccessPolicy::Open).await;
        let mut session = Session::new(LauncherClient::new(&base).unwrap());
        session.set_search("git");
        assert_eq!(session.drop_card("a", "b").await, DropOutcome::DragDisabled);
        session.set_search("");
        session.set_category(CategoryFilter::Uncategorized);
        assert_eq!(session.drop_card("a", "b").await, DropOutcome::DragDisabled);
        session.set_category(CategoryFilter::All);
        assert_eq!(session.drop_card("a", "a").await, DropOutcome::Unchanged);
    }
}
