use super::*;

use shared::domain::{Post, PostId};

use crate::test_support::FakeApi;

fn post(id: Option<i64>, name: &str) -> Post {
    Post {
        id: id.map(PostId),
        name: name.to_string(),
        email: format!("{name}@example.com"),
    }
}

fn controller_with(api: Arc<FakeApi<Post>>) -> ResourceController<Post> {
    ResourceController::<Post>::new(api, 16)
}

#[tokio::test]
async fn ensure_fresh_fetches_once_until_invalidated() {
    let api = Arc::new(FakeApi::posts(vec![post(Some(1), "a")]));
    let controller = controller_with(api.clone());

    controller.ensure_fresh().await.expect("first load");
    controller.ensure_fresh().await.expect("cached");
    assert_eq!(api.calls(), vec!["list"]);
    assert_eq!(controller.status().await, QueryStatus::Ready);

    controller.invalidate().await;
    controller.ensure_fresh().await.expect("reload");
    assert_eq!(api.calls(), vec!["list", "list"]);
}

#[tokio::test]
async fn create_appends_server_entity_and_notifies() {
    let api = Arc::new(FakeApi::posts(vec![post(Some(1), "a")]));
    let controller = controller_with(api.clone());
    controller.refresh().await.expect("load");
    let mut rx = controller.subscribe_events();

    let created = controller.create(post(None, "b")).await.expect("create");
    assert!(created.id.is_some());

    let entries = controller.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1], created);

    match rx.recv().await.expect("event") {
        StoreEvent::Created(entity) => assert_eq!(entity, created),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn update_replaces_by_id_and_delete_removes_by_id() {
    let api = Arc::new(FakeApi::posts(vec![post(Some(1), "a"), post(Some(2), "b")]));
    let controller = controller_with(api.clone());
    controller.refresh().await.expect("load");

    controller
        .update(post(Some(2), "bee"))
        .await
        .expect("update");
    let names: Vec<_> = controller
        .entries()
        .await
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["a", "bee"]);

    controller.delete(PostId(1)).await.expect("delete");
    assert_eq!(controller.entries().await, vec![post(Some(2), "bee")]);
    assert_eq!(api.calls(), vec!["list", "update 2", "delete 1"]);
}

#[tokio::test]
async fn update_without_id_is_rejected_before_any_request() {
    let api = Arc::new(FakeApi::posts(Vec::new()));
    let controller = controller_with(api.clone());

    let err = controller
        .update(post(None, "x"))
        .await
        .expect_err("missing id");
    assert!(matches!(err, ClientError::MissingId { resource: "posts" }));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn failed_mutation_leaves_store_untouched() {
    let api = Arc::new(FakeApi::posts(vec![post(Some(1), "a")]));
    let controller = controller_with(api.clone());
    controller.refresh().await.expect("load");
    api.set_failing(true);

    controller
        .create(post(None, "b"))
        .await
        .expect_err("create fails");
    controller.delete(PostId(1)).await.expect_err("delete fails");

    assert_eq!(controller.entries().await, vec![post(Some(1), "a")]);
}

#[tokio::test]
async fn failed_load_records_visible_message() {
    let api = Arc::new(FakeApi::posts(Vec::new()));
    api.set_failing(true);
    let controller = controller_with(api.clone());
    let mut rx = controller.subscribe_events();

    controller.refresh().await.expect_err("load fails");

    match controller.status().await {
        QueryStatus::Failed(message) => assert!(message.starts_with("An error occurred")),
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(matches!(rx.recv().await.expect("event"), StoreEvent::Loading));
    assert!(matches!(
        rx.recv().await.expect("event"),
        StoreEvent::Failed(_)
    ));
}
