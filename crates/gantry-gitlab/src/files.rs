//! Repository file publishing

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use tracing::{debug, info, instrument};

use gantry_core::{CommitAuthor, HostError, HostResult, Repo};

use crate::client::GitLabClient;
use crate::encoding::{encode_segment, project_id};
use crate::gateway::ApiRequest;
use crate::types::{FileWrite, RepositoryFile};

impl GitLabClient {
    /// Commit `content` to `path`, then confirm the commit landed.
    ///
    /// The write is issued exactly once. Existing files are updated, missing
    /// ones created. With `verify_writes` off the write response is trusted.
    #[instrument(
        skip(self, author, repo, content, message),
        fields(project = %repo, branch = tracing::field::Empty)
    )]
    pub(crate) async fn publish_file(
        &self,
        author: &CommitAuthor,
        repo: &Repo,
        content: &[u8],
        path: &str,
        message: &str,
    ) -> HostResult<()> {
        let branch = self.resolve_branch(repo).await?;
        tracing::Span::current().record("branch", branch.as_str());

        let file_path = format!(
            "projects/{}/repository/files/{}",
            project_id(repo),
            encode_segment(path)
        );
        let lookup = || ApiRequest::get(&file_path).with_query("ref", &branch);

        let exists = match self.send("get file", lookup()).await {
            Ok(_) => true,
            Err(HostError::NotFound { .. }) => false,
            Err(e) => return Err(e),
        };
        debug!(exists, branch = %branch, "probed file");

        let body = json!({
            "branch": branch,
            "content": BASE64.encode(content),
            "encoding": "base64",
            "author_name": author.name,
            "author_email": author.email,
            "commit_message": message,
        });
        let (operation, request) = if exists {
            ("update file", ApiRequest::put(&file_path))
        } else {
            ("create file", ApiRequest::post(&file_path))
        };

        let written: FileWrite = self.send(operation, request.with_json(body)).await?.json()?;
        let not_confirmed = |reason: String| HostError::WriteNotConfirmed {
            path: path.to_string(),
            branch: branch.clone(),
            reason,
        };

        if written.file_path.as_deref() != Some(path)
            || written.branch.as_deref() != Some(branch.as_str())
        {
            return Err(not_confirmed(format!(
                "service reported path {:?} on branch {:?}",
                written.file_path, written.branch
            )));
        }

        if self.verify_writes {
            let stored: RepositoryFile = self
                .send_until_visible("verify file", lookup())
                .await
                .map_err(|e| {
                    if e.is_transient() {
                        not_confirmed(e.to_string())
                    } else {
                        e
                    }
                })?
                .json()?;

            if stored.reference.as_deref().is_some_and(|r| r != branch) {
                return Err(not_confirmed(format!(
                    "read back from ref {:?}",
                    stored.reference
                )));
            }
        }

        info!(branch = %branch, updated = exists, "file committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RequestBody;
    use crate::testing::{client, client_with, created, ok, status, test_config, MockGateway};
    use gantry_core::ReleaseHost;
    use reqwest::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn author() -> CommitAuthor {
        CommitAuthor::new("bot", "bot@example.com")
    }

    const PROJECT: &str = "projects/someone%2Fsomething";

    /// Gateway for a project whose default branch is `main` and where
    /// `path` does not exist until written.
    fn fresh_file_gateway(path: &'static str) -> std::sync::Arc<MockGateway> {
        let writes = AtomicUsize::new(0);
        MockGateway::new(move |request| {
            if request.path == PROJECT {
                return ok(json!({"default_branch": "main"}));
            }
            let branch = match &request.body {
                RequestBody::Json(body) => body["branch"].as_str().unwrap_or_default().to_string(),
                _ => request.query_value("ref").unwrap_or_default().to_string(),
            };
            match request.method {
                Method::POST | Method::PUT => {
                    writes.fetch_add(1, Ordering::SeqCst);
                    created(json!({"file_path": path, "branch": branch}))
                }
                _ if writes.load(Ordering::SeqCst) == 0 => status(404),
                _ => ok(json!({"file_path": path, "ref": branch})),
            }
        })
    }

    #[tokio::test]
    async fn test_create_file_on_default_branch() {
        let gateway = fresh_file_gateway("newfile-in-default.txt");
        let client = client(&gateway);

        client
            .create_file(
                &author(),
                &Repo::new("someone", "something"),
                b"hello",
                "newfile-in-default.txt",
                "add file",
            )
            .await
            .unwrap();

        let file = format!("{}/repository/files/newfile-in-default%2Etxt", PROJECT);
        assert_eq!(
            gateway.calls(),
            vec![
                (Method::GET, PROJECT.to_string()),
                (Method::GET, file.clone()),
                (Method::POST, file.clone()),
                (Method::GET, file),
            ]
        );

        let requests = gateway.requests();
        assert_eq!(requests[1].query_value("ref"), Some("main"));
        assert_eq!(
            requests[2].body,
            RequestBody::Json(json!({
                "branch": "main",
                "content": "aGVsbG8=",
                "encoding": "base64",
                "author_name": "bot",
                "author_email": "bot@example.com",
                "commit_message": "add file",
            }))
        );
    }

    #[tokio::test]
    async fn test_create_file_explicit_branch_skips_project_lookup() {
        let gateway = fresh_file_gateway("newfile.txt");
        let client = client(&gateway);

        client
            .create_file(
                &author(),
                &Repo::new("someone", "something").with_branch("somebranch"),
                b"content",
                "newfile.txt",
                "add file",
            )
            .await
            .unwrap();

        assert!(gateway.calls().iter().all(|(_, path)| path != PROJECT));
        assert!(gateway
            .requests()
            .iter()
            .filter(|r| r.method == Method::GET)
            .all(|r| r.query_value("ref") == Some("somebranch")));
    }

    #[tokio::test]
    async fn test_existing_file_is_updated() {
        let gateway = MockGateway::new(|request| match request.method {
            Method::PUT => ok(json!({"file_path": "README.md", "branch": "main"})),
            Method::POST => panic!("existing file must not be re-created"),
            _ => ok(json!({"file_path": "README.md", "ref": "main"})),
        });
        let client = client(&gateway);

        client
            .create_file(
                &author(),
                &Repo::new("someone", "something").with_branch("main"),
                b"docs",
                "README.md",
                "update readme",
            )
            .await
            .unwrap();

        let methods: Vec<Method> = gateway.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![Method::GET, Method::PUT, Method::GET]);
    }

    #[tokio::test]
    async fn test_doomed_write_is_an_error() {
        let gateway = MockGateway::new(|request| match request.method {
            Method::POST => created(json!({"file_path": "doomed-file-404.txt", "branch": "main"})),
            _ => status(404),
        });
        let client = client(&gateway);

        let err = client
            .create_file(
                &author(),
                &Repo::new("someone", "something").with_branch("main"),
                b"doomed",
                "doomed-file-404.txt",
                "never lands",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::WriteNotConfirmed { ref path, .. } if path == "doomed-file-404.txt"));
        // probe, write, then the full verification budget
        assert_eq!(gateway.request_count(), 5);
        let writes = gateway
            .calls()
            .into_iter()
            .filter(|(m, _)| *m == Method::POST)
            .count();
        assert_eq!(writes, 1);
    }

    #[tokio::test]
    async fn test_write_response_mismatch() {
        let gateway = MockGateway::new(|request| match request.method {
            Method::POST => created(json!({"file_path": "other.txt", "branch": "main"})),
            _ => status(404),
        });
        let client = client(&gateway);

        let err = client
            .create_file(
                &author(),
                &Repo::new("someone", "something").with_branch("main"),
                b"x",
                "file.txt",
                "msg",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::WriteNotConfirmed { .. }));
        assert_eq!(gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_write_failure_is_not_retried() {
        let gateway = MockGateway::new(|request| match request.method {
            Method::POST => status(400),
            _ => status(404),
        });
        let client = client(&gateway);

        let err = client
            .create_file(
                &author(),
                &Repo::new("someone", "something").with_branch("main"),
                b"x",
                "file.txt",
                "msg",
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_probe_failure_is_fatal() {
        let gateway = MockGateway::new(|_| status(403));
        let client = client(&gateway);

        let err = client
            .create_file(
                &author(),
                &Repo::new("someone", "something").with_branch("main"),
                b"x",
                "file.txt",
                "msg",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::Forbidden { .. }));
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unverified_write_trusts_response() {
        let gateway = MockGateway::new(|request| match request.method {
            Method::POST => created(json!({"file_path": "file.txt", "branch": "main"})),
            _ => status(404),
        });
        let mut config = test_config();
        config.files.verify_writes = false;
        let client = client_with(&gateway, config);

        client
            .create_file(
                &author(),
                &Repo::new("someone", "something").with_branch("main"),
                b"x",
                "file.txt",
                "msg",
            )
            .await
            .unwrap();

        assert_eq!(gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_nested_path_is_one_segment() {
        let gateway = MockGateway::new(|request| match request.method {
            Method::POST => created(json!({"file_path": "Formula/app.rb", "branch": "main"})),
            _ => status(404),
        });
        let mut config = test_config();
        config.files.verify_writes = false;
        let client = client_with(&gateway, config);

        client
            .create_file(
                &author(),
                &Repo::new("someone", "something").with_branch("main"),
                b"class App; end",
                "Formula/app.rb",
                "brew formula",
            )
            .await
            .unwrap();

        assert_eq!(
            gateway.calls()[1].1,
            format!("{}/repository/files/Formula%2Fapp%2Erb", PROJECT)
        );
    }
}
