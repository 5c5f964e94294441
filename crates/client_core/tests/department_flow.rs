use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use client_core::{
    ClientSettings, CrudClient, EmployeeField, FieldPath, FormEvent, QueryStatus,
};
use shared::domain::{Department, DepartmentId, Employee, EmployeeId, Skill};
use tokio::{net::TcpListener, sync::Mutex};

type Departments = Arc<Mutex<Vec<Department>>>;

async fn list(State(state): State<Departments>) -> Json<Vec<Department>> {
    Json(state.lock().await.clone())
}

async fn create(
    State(state): State<Departments>,
    Json(mut department): Json<Department>,
) -> (StatusCode, Json<Department>) {
    let mut departments = state.lock().await;
    department.id = Some(DepartmentId(departments.len() as i64 + 1));
    departments.push(department.clone());
    (StatusCode::CREATED, Json(department))
}

async fn update(
    State(state): State<Departments>,
    Path(id): Path<i64>,
    Json(department): Json<Department>,
) -> Result<Json<Department>, StatusCode> {
    let mut departments = state.lock().await;
    let slot = departments
        .iter_mut()
        .find(|existing| existing.id == Some(DepartmentId(id)))
        .ok_or(StatusCode::NOT_FOUND)?;
    *slot = department.clone();
    Ok(Json(department))
}

async fn remove(State(state): State<Departments>, Path(id): Path<i64>) -> StatusCode {
    state
        .lock()
        .await
        .retain(|existing| existing.id != Some(DepartmentId(id)));
    StatusCode::OK
}

async fn spawn_department_server(seed: Vec<Department>) -> (String, Departments) {
    let state: Departments = Arc::new(Mutex::new(seed));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/departments", get(list).post(create))
        .route("/departments/:id", put(update).delete(remove))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn eng_department() -> Department {
    Department {
        id: Some(DepartmentId(1)),
        name: "Eng".to_string(),
        employees: vec![Employee {
            id: Some(EmployeeId(7)),
            name: "Al".to_string(),
            position: "Dev".to_string(),
            skills: vec![Skill::named("Go")],
        }],
    }
}

fn client_for(base_url: String) -> CrudClient {
    CrudClient::new(ClientSettings {
        api_base_url: base_url,
        ..ClientSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn edit_nested_skills_and_submit_over_http() {
    let (base_url, server) = spawn_department_server(vec![eng_department()]).await;
    let client = client_for(base_url);
    client.departments.ensure_fresh().await.expect("load");

    let mut form = client.department_form();
    let mut events = form.subscribe_events();
    form.begin_edit_at(&client.departments, 0)
        .await
        .expect("begin edit");
    form.add_skill(0).expect("add skill");
    form.update_field(FieldPath::Skill { employee: 0, skill: 1 }, "Rust")
        .expect("skill name");
    form.submit(&client.departments).await.expect("submit");

    let expected_skills = vec![Skill::named("Go"), Skill::named("Rust")];
    assert_eq!(server.lock().await[0].employees[0].skills, expected_skills);
    assert_eq!(
        client.departments.entries().await[0].employees[0].skills,
        expected_skills
    );

    let mut saw_submitted = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, FormEvent::Submitted(_)) {
            saw_submitted = true;
        }
    }
    assert!(saw_submitted);
}

#[tokio::test]
async fn create_department_from_blank_form_then_delete() {
    let (base_url, server) = spawn_department_server(Vec::new()).await;
    let client = client_for(base_url);
    client.departments.ensure_fresh().await.expect("load");

    let mut form = client.department_form();
    form.begin_create();
    form.update_field(FieldPath::DepartmentName, "Research")
        .expect("name");
    form.update_field(
        FieldPath::Employee {
            index: 0,
            field: EmployeeField::Name,
        },
        "Cy",
    )
    .expect("employee name");
    form.add_employee().expect("second employee");
    let created = form.submit(&client.departments).await.expect("create");

    let id = created.id.expect("server id");
    {
        let stored = server.lock().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].employees.len(), 2);
        assert_ne!(stored[0].employees[0].id, stored[0].employees[1].id);
    }

    client.departments.delete(id).await.expect("delete");
    assert!(server.lock().await.is_empty());
    assert!(client.departments.entries().await.is_empty());
    assert_eq!(client.departments.status().await, QueryStatus::Ready);
}
