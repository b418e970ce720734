use server_api::ApiContext;
use shared::protocol::ViewNotice;
use tokio::sync::broadcast;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) notices: broadcast::Sender<ViewNotice>,
}
