//! Helpers shared by the integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;
use std::sync::Arc;

use wiremock::MockServer;
use zhihu_client::login::{NoViewer, PlainEncryptor, Prompter};
use zhihu_client::{Endpoints, ZhihuClient, ZhihuClientBuilder};

/// Builder pointed at `server` for both origins, with files under `dir`,
/// the plain cipher and no image viewer.
pub fn mock_client_builder(server: &MockServer, dir: &Path) -> ZhihuClientBuilder {
    ZhihuClient::builder()
        .endpoints(Endpoints::single(&server.uri()).unwrap())
        .cookie_file(dir.join("cookies.txt"))
        .captcha_file(dir.join("captcha.jpg"))
        .encryptor(Arc::new(PlainEncryptor))
        .viewer(Arc::new(NoViewer))
}

/// Same as [`mock_client_builder`] with scripted answers.
pub fn mock_client_with_prompter(
    server: &MockServer,
    dir: &Path,
    prompter: Arc<dyn Prompter>,
) -> ZhihuClient {
    mock_client_builder(server, dir)
        .prompter(prompter)
        .build()
        .unwrap()
}
