//! Release lookup and creation

use serde_json::json;
use tracing::{debug, info, instrument};

use gantry_core::{HostError, HostResult, NewRelease, ReleaseHandle, Repo};

use crate::client::GitLabClient;
use crate::encoding::{encode_segment, project_id};
use crate::gateway::ApiRequest;
use crate::types::Release;

pub(crate) fn release_path(project: &str, tag: &str) -> String {
    format!("projects/{}/releases/{}", project, encode_segment(tag))
}

impl GitLabClient {
    /// Return the release for `release.tag`, creating it when the lookup
    /// reports 404 or 403.
    ///
    /// A created release is only returned once a follow-up read sees it.
    #[instrument(skip(self, repo, release), fields(project = %repo, tag = %release.tag))]
    pub(crate) async fn resolve_release(
        &self,
        repo: &Repo,
        release: &NewRelease,
    ) -> HostResult<ReleaseHandle> {
        let project = project_id(repo);
        let path = release_path(&project, &release.tag);

        match self.send("get release", ApiRequest::get(&path)).await {
            Ok(response) => {
                debug!("release already exists");
                return Ok(response.json::<Release>()?.into_handle(repo, release));
            }
            Err(e) if e.is_transient() => {
                debug!(error = %e, "release not found, creating it");
            }
            Err(e) => return Err(e),
        }

        let mut body = json!({
            "tag_name": release.tag,
            "name": release.title(),
            "description": release.description,
        });
        if let Some(reference) = &release.reference {
            body["ref"] = json!(reference);
        }

        let create = ApiRequest::post(format!("projects/{}/releases", project)).with_json(body);
        match self.send("create release", create).await {
            Ok(_) => info!("release created"),
            Err(HostError::Conflict { message }) => {
                info!(%message, "release was created concurrently, reading it back");
            }
            Err(e) => return Err(e),
        }

        let confirmed = self
            .send_until_visible("confirm release", ApiRequest::get(&path))
            .await
            .map_err(|e| {
                if e.is_transient() {
                    HostError::NotVisible {
                        resource: format!("release {}", release.tag),
                        reason: e.to_string(),
                    }
                } else {
                    e
                }
            })?;

        Ok(confirmed.json::<Release>()?.into_handle(repo, release))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client, created, ok, status, MockGateway};
    use gantry_core::{ErrorClass, ReleaseHost};
    use reqwest::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn repo() -> Repo {
        Repo::new("owner", "name")
    }

    const RELEASE_PATH: &str = "projects/owner%2Fname/releases/v1%2E0%2E0";

    #[tokio::test]
    async fn test_existing_release_is_returned_without_create() {
        let gateway = MockGateway::new(|_| {
            ok(json!({"tag_name": "v1.0.0", "name": "Existing", "description": "old notes"}))
        });
        let client = client(&gateway);

        let handle = client
            .get_or_create_release(&repo(), &NewRelease::new("v1.0.0").with_description("new"))
            .await
            .unwrap();

        assert_eq!(handle.name, "Existing");
        assert_eq!(handle.description, "old notes");
        assert_eq!(gateway.calls(), vec![(Method::GET, RELEASE_PATH.to_string())]);
    }

    #[tokio::test]
    async fn test_missing_release_is_created_and_confirmed() {
        for missing in [404u16, 403] {
            let lookups = AtomicUsize::new(0);
            let gateway = MockGateway::new(move |request| {
                if request.method == Method::POST {
                    return created(json!({"tag_name": "v1.0.0"}));
                }
                if lookups.fetch_add(1, Ordering::SeqCst) == 0 {
                    status(missing)
                } else {
                    ok(json!({"tag_name": "v1.0.0", "name": "v1.0.0"}))
                }
            });
            let client = client(&gateway);

            let handle = client
                .get_or_create_release(&repo(), &NewRelease::new("v1.0.0"))
                .await
                .unwrap();

            assert_eq!(handle.tag, "v1.0.0");
            assert_eq!(
                gateway.calls(),
                vec![
                    (Method::GET, RELEASE_PATH.to_string()),
                    (Method::POST, "projects/owner%2Fname/releases".to_string()),
                    (Method::GET, RELEASE_PATH.to_string()),
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_create_body_carries_release_fields() {
        let lookups = AtomicUsize::new(0);
        let gateway = MockGateway::new(move |request| {
            if request.method == Method::POST {
                return created(json!({}));
            }
            if lookups.fetch_add(1, Ordering::SeqCst) == 0 {
                status(404)
            } else {
                ok(json!({}))
            }
        });
        let client = client(&gateway);

        let release = NewRelease::new("v1.0.0")
            .with_name("Version 1")
            .with_description("notes")
            .with_reference("main");
        client.get_or_create_release(&repo(), &release).await.unwrap();

        let post = &gateway.requests()[1];
        assert_eq!(
            post.body,
            crate::gateway::RequestBody::Json(json!({
                "tag_name": "v1.0.0",
                "name": "Version 1",
                "description": "notes",
                "ref": "main",
            }))
        );
    }

    #[tokio::test]
    async fn test_create_rejected_is_two_requests() {
        let gateway = MockGateway::new(|request| {
            if request.method == Method::POST {
                status(422)
            } else {
                status(404)
            }
        });
        let client = client(&gateway);

        let err = client
            .get_or_create_release(&repo(), &NewRelease::new("v1.0.0"))
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::Unprocessable { .. }));
        assert_eq!(gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_lookup_failure_other_than_missing_skips_create() {
        for code in [500u16, 422, 401] {
            let gateway = MockGateway::new(move |_| status(code));
            let client = client(&gateway);

            let err = client
                .get_or_create_release(&repo(), &NewRelease::new("v1.0.0"))
                .await
                .unwrap_err();

            assert_eq!(err.status(), Some(code));
            assert_eq!(gateway.request_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_transport_failure_skips_create() {
        let gateway =
            MockGateway::new(|_| Err(HostError::Transport("connection refused".to_string())));
        let client = client(&gateway);

        let err = client
            .get_or_create_release(&repo(), &NewRelease::new("v1.0.0"))
            .await
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::Transport);
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_conflict_on_create_reads_back() {
        let lookups = AtomicUsize::new(0);
        let gateway = MockGateway::new(move |request| {
            if request.method == Method::POST {
                return status(409);
            }
            if lookups.fetch_add(1, Ordering::SeqCst) == 0 {
                status(404)
            } else {
                ok(json!({"tag_name": "v1.0.0", "name": "raced"}))
            }
        });
        let client = client(&gateway);

        let handle = client
            .get_or_create_release(&repo(), &NewRelease::new("v1.0.0"))
            .await
            .unwrap();

        assert_eq!(handle.name, "raced");
        assert_eq!(gateway.request_count(), 3);
    }

    #[tokio::test]
    async fn test_release_never_visible() {
        let gateway = MockGateway::new(|request| {
            if request.method == Method::POST {
                created(json!({}))
            } else {
                status(404)
            }
        });
        let client = client(&gateway);

        let err = client
            .get_or_create_release(&repo(), &NewRelease::new("v1.0.0"))
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::NotVisible { .. }));
        // lookup, create, then the full verification budget
        assert_eq!(gateway.request_count(), 5);
    }

    #[tokio::test]
    async fn test_second_call_reuses_release() {
        let exists = Mutex::new(false);
        let gateway = MockGateway::new(move |request| {
            let mut exists = exists.lock().unwrap();
            if request.method == Method::POST {
                assert!(!*exists, "release created twice");
                *exists = true;
                return created(json!({}));
            }
            if *exists {
                ok(json!({"tag_name": "v1.0.0"}))
            } else {
                status(404)
            }
        });
        let client = client(&gateway);
        let release = NewRelease::new("v1.0.0");

        let first = client.get_or_create_release(&repo(), &release).await.unwrap();
        let second = client.get_or_create_release(&repo(), &release).await.unwrap();

        assert_eq!(first.tag, second.tag);
        let creates = gateway
            .calls()
            .into_iter()
            .filter(|(method, _)| *method == Method::POST)
            .count();
        assert_eq!(creates, 1);
        assert_eq!(gateway.request_count(), 4);
    }
}
