//! GraphQL schema driven directly, one request per call, over an on-disk
//! database.

use std::sync::Arc;

use roastr::auth::{create_session, Viewer};
use roastr::db::{self, SqliteBackend};
use roastr::extractors::SessionToken;
use roastr::graphql::{attach_notices, build_schema, scope_request, RoastrSchema};
use roastr::service::Roastr;
use roastr::state::DbPool;
use serde_json::Value;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    pool: DbPool,
    roastr: Arc<Roastr>,
    schema: RoastrSchema,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let pool = db::create_pool(&dir.path().join("test.db")).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");
    let roastr = Arc::new(Roastr::new(Arc::new(SqliteBackend::new(pool.clone()))));
    Harness {
        _dir: dir,
        pool,
        roastr,
        schema: build_schema(),
    }
}

fn viewer(id: &str) -> Option<Viewer> {
    Some(Viewer {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
    })
}

impl Harness {
    /// Run one request and return `(data, notices)` as JSON.
    async fn exec_as(
        &self,
        query: &str,
        viewer: Option<Viewer>,
        token: Option<SessionToken>,
    ) -> (Value, Value) {
        let (request, log) = scope_request(
            async_graphql::Request::new(query),
            self.roastr.clone(),
            self.pool.clone(),
            viewer,
            token,
        );
        let response = attach_notices(self.schema.execute(request).await, &log);
        assert!(
            response.errors.is_empty(),
            "Expected no errors, got: {:?}",
            response.errors
        );

        let notices = response
            .extensions
            .get("notices")
            .map(|v| v.clone().into_json().unwrap())
            .unwrap_or(Value::Null);
        (response.data.into_json().unwrap(), notices)
    }

    async fn exec(&self, query: &str, viewer: Option<Viewer>) -> (Value, Value) {
        self.exec_as(query, viewer, None).await
    }
}

fn notice_messages(notices: &Value) -> Vec<String> {
    notices
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|n| n["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn anonymous_visitor_can_post_but_not_vote_or_save() {
    let h = harness();
    // Narrow the catalog to a single tag.
    h.pool
        .get()
        .unwrap()
        .execute("DELETE FROM tags WHERE name != 'Joke'", [])
        .unwrap();

    let (data, _) = h.exec("{ tags { name emoji isSensitive } }", None).await;
    assert_eq!(
        data["tags"],
        serde_json::json!([{ "name": "Joke", "emoji": "😂", "isSensitive": false }])
    );

    let (data, notices) = h
        .exec(
            r#"mutation { createPost(input: { content: "Your code compiles? Suspicious.", tags: ["Joke"], isAnonymous: true }) { success postId } }"#,
            None,
        )
        .await;
    assert_eq!(data["createPost"]["success"], true);
    assert_eq!(notice_messages(&notices), vec!["Post created successfully! 🔥"]);
    let post_id = data["createPost"]["postId"].as_str().unwrap().to_string();

    let (data, _) = h
        .exec("{ feed { id username isAnonymous isNsfw isOwn } }", None)
        .await;
    let feed = data["feed"].as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["id"], post_id.as_str());
    assert_eq!(feed[0]["username"], "Anonymous");
    assert_eq!(feed[0]["isAnonymous"], true);
    assert_eq!(feed[0]["isNsfw"], false);
    assert_eq!(feed[0]["isOwn"], false);

    let vote = format!(
        r#"mutation {{ vote(postId: "{}", vote: UPVOTE) {{ success message }} }}"#,
        post_id
    );
    let (data, notices) = h.exec(&vote, None).await;
    assert_eq!(data["vote"]["success"], false);
    assert_eq!(data["vote"]["message"], "Please log in to vote");
    assert_eq!(notice_messages(&notices), vec!["Please log in to vote"]);

    let save = format!(
        r#"mutation {{ toggleSave(postId: "{}") {{ success message }} }}"#,
        post_id
    );
    let (data, _) = h.exec(&save, None).await;
    assert_eq!(data["toggleSave"]["success"], false);
    assert_eq!(data["toggleSave"]["message"], "Please log in to save posts");

    let report = format!(
        r#"mutation {{ reportPost(postId: "{}") {{ success }} }}"#,
        post_id
    );
    let (data, _) = h.exec(&report, None).await;
    assert_eq!(data["reportPost"]["success"], true);
}

#[tokio::test]
async fn signed_in_viewer_round_trip() {
    let h = harness();
    let me = || viewer("user-1");

    let (data, _) = h.exec("{ me { id email username } }", me()).await;
    assert_eq!(data["me"]["id"], "user-1");
    assert!(data["me"]["username"].is_null());

    let (data, notices) = h
        .exec(
            r#"mutation { updateProfile(username: "  toastmaster  ") { success profile { username } } }"#,
            me(),
        )
        .await;
    assert_eq!(data["updateProfile"]["profile"]["username"], "toastmaster");
    assert_eq!(notice_messages(&notices), vec!["Profile updated successfully!"]);

    let (data, _) = h
        .exec(
            r#"mutation { createPost(input: { content: "You're the reason shampoo has instructions", tags: ["Roast", "NSFW"] }) { success postId } }"#,
            me(),
        )
        .await;
    let post_id = data["createPost"]["postId"].as_str().unwrap().to_string();

    let vote = format!(
        r#"mutation {{ vote(postId: "{}", vote: UPVOTE) {{ success userVote }} }}"#,
        post_id
    );
    let (data, notices) = h.exec(&vote, me()).await;
    assert_eq!(data["vote"]["userVote"], "UPVOTE");
    assert!(notices.is_null());

    let (data, _) = h
        .exec("{ feed { username upvotes userVote isNsfw isOwn shareText } }", me())
        .await;
    let item = &data["feed"][0];
    assert_eq!(item["username"], "toastmaster");
    assert_eq!(item["upvotes"], 1);
    assert_eq!(item["userVote"], "UPVOTE");
    assert_eq!(item["isNsfw"], true);
    assert_eq!(item["isOwn"], true);
    assert!(item["shareText"]
        .as_str()
        .unwrap()
        .ends_with("🔗 Check out more roasts on Roastr!"));

    let (data, _) = h.exec(&vote, me()).await;
    assert!(data["vote"]["userVote"].is_null());

    let save = format!(
        r#"mutation {{ toggleSave(postId: "{}") {{ saved message }} }}"#,
        post_id
    );
    let (data, _) = h.exec(&save, me()).await;
    assert_eq!(data["toggleSave"]["saved"], true);
    assert_eq!(data["toggleSave"]["message"], "Post saved to library! 📌");

    let (data, _) = h.exec("{ savedPosts { id isSaved } }", me()).await;
    assert_eq!(data["savedPosts"][0]["id"], post_id.as_str());
    assert_eq!(data["savedPosts"][0]["isSaved"], true);

    let delete = format!(
        r#"mutation {{ deletePost(postId: "{}") {{ success message }} }}"#,
        post_id
    );
    let (data, _) = h.exec(&delete, viewer("someone-else")).await;
    assert_eq!(data["deletePost"]["success"], false);
    assert_eq!(data["deletePost"]["message"], "You can only delete your own posts");

    let (data, _) = h.exec(&delete, me()).await;
    assert_eq!(data["deletePost"]["success"], true);

    let (data, _) = h.exec("{ feed { id } savedPosts { id } }", me()).await;
    assert!(data["feed"].as_array().unwrap().is_empty());
    assert!(data["savedPosts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_drafts_report_the_first_failing_rule() {
    let h = harness();

    let (data, notices) = h
        .exec(
            r#"mutation { createPost(input: { content: "   ", tags: [] }) { success message } }"#,
            None,
        )
        .await;
    assert_eq!(data["createPost"]["success"], false);
    assert_eq!(data["createPost"]["message"], "Please enter some content!");
    assert_eq!(notice_messages(&notices).len(), 1);

    let (data, _) = h
        .exec(
            r#"mutation { createPost(input: { content: "hi", tags: [] }) { message } }"#,
            None,
        )
        .await;
    assert_eq!(data["createPost"]["message"], "Please select at least one tag!");

    let long = "x".repeat(2001);
    let query = format!(
        r#"mutation {{ createPost(input: {{ content: "{}", tags: ["Joke"] }}) {{ message }} }}"#,
        long
    );
    let (data, _) = h.exec(&query, None).await;
    assert_eq!(
        data["createPost"]["message"],
        "Content is too long! Maximum 2000 characters."
    );

    let (data, _) = h.exec("{ feed { id } }", None).await;
    assert!(data["feed"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn feed_filters_by_any_tag_and_sorts() {
    let h = harness();
    for (content, tag) in [("first", "Joke"), ("second", "Roast"), ("third", "Wholesome")] {
        let query = format!(
            r#"mutation {{ createPost(input: {{ content: "{}", tags: ["{}"] }}) {{ success }} }}"#,
            content, tag
        );
        h.exec(&query, None).await;
    }

    let (data, _) = h
        .exec(
            r#"{ feed(tags: ["Joke", "Wholesome"], sort: OLDEST) { content } }"#,
            None,
        )
        .await;
    assert_eq!(
        data["feed"],
        serde_json::json!([{ "content": "first" }, { "content": "third" }])
    );

    let (data, _) = h.exec("{ feed { content } }", None).await;
    let newest: Vec<&str> = data["feed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap())
        .collect();
    assert_eq!(newest, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn sign_out_ends_the_session() {
    let h = harness();
    let token = create_session(&h.pool, "user-1", None, 1).unwrap();

    let (data, _) = h
        .exec_as(
            "mutation { signOut { success } }",
            viewer("user-1"),
            Some(SessionToken(token.clone())),
        )
        .await;
    assert_eq!(data["signOut"]["success"], true);
    assert!(roastr::auth::resolve_session(&h.pool, &token).unwrap().is_none());

    let (data, _) = h.exec("mutation { signOut { success } }", None).await;
    assert_eq!(data["signOut"]["success"], false);
}
