use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::transport::GitLabClient;
use crate::error::Result;
use crate::providers::gitlab::raw::{Connection, RawProject};

/// Upper bound on followed pages so a server that keeps answering
/// `hasNextPage: true` cannot keep us looping.
pub const MAX_PROJECT_PAGES: usize = 100;

const LIST_MY_PROJECTS: &str = r#"
query ListMyProjects($after: String) {
    projects(membership: true, after: $after) {
        nodes {
            id
            name
            fullPath
            repository {
                rootRef
            }
        }
        pageInfo {
            hasNextPage
            endCursor
        }
    }
}
"#;

#[derive(Serialize)]
struct ListMyProjectsVariables {
    after: Option<String>,
}

#[derive(Deserialize)]
struct ListMyProjectsData {
    projects: Option<Connection<RawProject>>,
}

impl GitLabClient {
    /// Fetches every project the operator is a member of.
    ///
    /// Follows `pageInfo.endCursor` until `hasNextPage` is false and keeps the
    /// server's order. Stops early (with a warning) after [`MAX_PROJECT_PAGES`]
    /// pages or when the server reports more pages without a cursor.
    pub async fn fetch_my_projects(&self) -> Result<Vec<RawProject>> {
        let mut all_projects = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 1..=MAX_PROJECT_PAGES {
            let data: ListMyProjectsData = self
                .execute_graphql_request(
                    "ListMyProjects",
                    LIST_MY_PROJECTS,
                    ListMyProjectsVariables {
                        after: cursor.take(),
                    },
                )
                .await?;

            let Some(mut projects) = data.projects else {
                break;
            };

            let page_info = projects.page_info.take().unwrap_or_default();
            let nodes = projects.into_nodes();
            debug!("Project page {page}: {} projects", nodes.len());
            all_projects.extend(nodes);

            if !page_info.has_next_page {
                return Ok(all_projects);
            }

            cursor = page_info.end_cursor;
            if cursor.is_none() {
                warn!("Server reported more projects without a cursor, stopping at page {page}");
                return Ok(all_projects);
            }
        }

        warn!(
            "Stopped listing projects after {MAX_PROJECT_PAGES} pages; {} projects fetched",
            all_projects.len()
        );

        Ok(all_projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn page(ids: &[u32], has_next_page: bool, end_cursor: Option<&str>) -> String {
        let nodes: Vec<_> = ids
            .iter()
            .map(|id| {
                json!({
                    "id": format!("gid://gitlab/Project/{id}"),
                    "name": format!("project-{id}"),
                    "fullPath": format!("group/project-{id}"),
                    "repository": {"rootRef": "main"}
                })
            })
            .collect();

        json!({"data": {"projects": {
            "nodes": nodes,
            "pageInfo": {"hasNextPage": has_next_page, "endCursor": end_cursor}
        }}})
        .to_string()
    }

    async fn mock_page(
        server: &mut mockito::ServerGuard,
        after: Option<&str>,
        body: String,
    ) -> mockito::Mock {
        server
            .mock("POST", "/api/graphql")
            .match_body(Matcher::PartialJson(json!({"variables": {"after": after}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_three_pages_are_concatenated_in_order() {
        let mut server = mockito::Server::new_async().await;
        let first = mock_page(&mut server, None, page(&[1, 2], true, Some("c1"))).await;
        let second = mock_page(&mut server, Some("c1"), page(&[3, 4], true, Some("c2"))).await;
        let third = mock_page(&mut server, Some("c2"), page(&[5], false, None)).await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let projects = client.fetch_my_projects().await.unwrap();

        let ids: Vec<_> = projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "gid://gitlab/Project/1",
                "gid://gitlab/Project/2",
                "gid://gitlab/Project/3",
                "gid://gitlab/Project/4",
                "gid://gitlab/Project/5",
            ]
        );
        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_cursor_stops_pagination() {
        let mut server = mockito::Server::new_async().await;
        let only = mock_page(&mut server, None, page(&[1], true, None)).await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let projects = client.fetch_my_projects().await.unwrap();

        assert_eq!(projects.len(), 1);
        only.assert_async().await;
    }

    #[tokio::test]
    async fn test_page_bound_stops_endless_server() {
        let mut server = mockito::Server::new_async().await;
        let endless = server
            .mock("POST", "/api/graphql")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page(&[1], true, Some("again")))
            .expect(MAX_PROJECT_PAGES)
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let projects = client.fetch_my_projects().await.unwrap();

        assert_eq!(projects.len(), MAX_PROJECT_PAGES);
        endless.assert_async().await;
    }
}
