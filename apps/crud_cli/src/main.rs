use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    load_settings, user_facing_message, ClientError, CrudClient, DepartmentDraft, EmployeeField,
    FieldPath, FormSession, PostField,
};
use serde::Serialize;
use shared::domain::{DepartmentId, PostId};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "List and edit posts and departments on a REST backend")]
struct Cli {
    /// Overrides `api_base_url` from client.toml / APP__API_BASE_URL.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Posts(PostCommand),
    #[command(subcommand)]
    Departments(DepartmentCommand),
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Edits the post shown at INDEX in `posts list`.
    Update {
        #[arg(long)]
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum DepartmentCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        /// NAME:POSITION[:SKILL,SKILL...], repeatable.
        #[arg(long = "employee", value_parser = parse_employee)]
        employees: Vec<EmployeeSpec>,
    },
    Rename {
        #[arg(long)]
        index: usize,
        #[arg(long)]
        name: String,
    },
    AddEmployee {
        #[arg(long)]
        index: usize,
        #[arg(value_parser = parse_employee)]
        employee: EmployeeSpec,
    },
    AddSkill(SkillTarget),
    SetSkill {
        #[command(flatten)]
        target: SkillTarget,
        #[arg(long)]
        skill_index: usize,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Args, Debug)]
struct SkillTarget {
    /// Department position in `departments list`.
    #[arg(long)]
    index: usize,
    #[arg(long)]
    employee: usize,
    #[arg(long)]
    skill: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EmployeeSpec {
    name: String,
    position: String,
    skills: Vec<String>,
}

fn parse_employee(raw: &str) -> Result<EmployeeSpec, String> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    let position = parts
        .next()
        .ok_or_else(|| format!("expected NAME:POSITION[:SKILLS], got '{raw}'"))?
        .trim();
    if name.is_empty() {
        return Err(format!("employee name is empty in '{raw}'"));
    }
    let skills = parts
        .next()
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|skill| !skill.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(EmployeeSpec {
        name: name.to_string(),
        position: position.to_string(),
        skills,
    })
}

fn applied(changed: bool, what: &str) -> Result<()> {
    if !changed {
        bail!("draft rejected edit: {what}");
    }
    Ok(())
}

fn fill_employee(
    form: &mut FormSession<DepartmentDraft>,
    index: usize,
    spec: &EmployeeSpec,
) -> Result<()> {
    let name = FieldPath::Employee {
        index,
        field: EmployeeField::Name,
    };
    let position = FieldPath::Employee {
        index,
        field: EmployeeField::Position,
    };
    applied(form.update_field(name, spec.name.clone())?, "employee name")?;
    applied(
        form.update_field(position, spec.position.clone())?,
        "employee position",
    )?;
    for (skill, skill_name) in spec.skills.iter().enumerate() {
        // new employees are seeded with one blank skill
        if skill > 0 {
            applied(form.add_skill(index)?, "add skill")?;
        }
        applied(
            form.update_field(
                FieldPath::Skill {
                    employee: index,
                    skill,
                },
                skill_name.clone(),
            )?,
            "skill name",
        )?;
    }
    Ok(())
}

/// Starts a create draft holding exactly `employees`.
fn fill_new_department(
    form: &mut FormSession<DepartmentDraft>,
    name: String,
    employees: &[EmployeeSpec],
) -> Result<()> {
    form.begin_create();
    applied(
        form.update_field(FieldPath::DepartmentName, name)?,
        "department name",
    )?;
    // the blank form already holds one employee
    if employees.is_empty() {
        return applied(form.remove_employee(0)?, "remove seed employee");
    }
    for (index, spec) in employees.iter().enumerate() {
        if index > 0 {
            applied(form.add_employee()?, "add employee")?;
        }
        fill_employee(form, index, spec)?;
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_posts(client: &CrudClient, command: PostCommand) -> Result<()> {
    client.posts.ensure_fresh().await?;
    match command {
        PostCommand::List => print_json(&client.posts.entries().await),
        PostCommand::Create { name, email } => {
            let mut form = client.post_form();
            form.begin_create();
            form.update_field(PostField::Name, name)?;
            form.update_field(PostField::Email, email)?;
            print_json(&form.submit(&client.posts).await?)
        }
        PostCommand::Update { index, name, email } => {
            let mut form = client.post_form();
            form.begin_edit_at(&client.posts, index).await?;
            if let Some(name) = name {
                form.update_field(PostField::Name, name)?;
            }
            if let Some(email) = email {
                form.update_field(PostField::Email, email)?;
            }
            print_json(&form.submit(&client.posts).await?)
        }
        PostCommand::Delete { id } => {
            client.posts.delete(PostId(id)).await?;
            print_json(&client.posts.entries().await)
        }
    }
}

async fn run_departments(client: &CrudClient, command: DepartmentCommand) -> Result<()> {
    let departments = &client.departments;
    departments.ensure_fresh().await?;
    let mut form = client.department_form();

    match command {
        DepartmentCommand::List => return print_json(&departments.entries().await),
        DepartmentCommand::Delete { id } => {
            departments.delete(DepartmentId(id)).await?;
            return print_json(&departments.entries().await);
        }
        DepartmentCommand::Create { name, employees } => {
            fill_new_department(&mut form, name, &employees)?;
        }
        DepartmentCommand::Rename { index, name } => {
            form.begin_edit_at(departments, index).await?;
            applied(
                form.update_field(FieldPath::DepartmentName, name)?,
                "department name",
            )?;
        }
        DepartmentCommand::AddEmployee { index, employee } => {
            let draft = form.begin_edit_at(departments, index).await?;
            let new_index = draft.employees().len();
            applied(form.add_employee()?, "add employee")?;
            fill_employee(&mut form, new_index, &employee)?;
        }
        DepartmentCommand::AddSkill(target) => {
            let draft = form.begin_edit_at(departments, target.index).await?;
            let new_skill = draft
                .employees()
                .get(target.employee)
                .map(|employee| employee.skills.len())
                .with_context(|| format!("no employee at index {}", target.employee))?;
            applied(form.add_skill(target.employee)?, "add skill")?;
            applied(
                form.update_field(
                    FieldPath::Skill {
                        employee: target.employee,
                        skill: new_skill,
                    },
                    target.skill,
                )?,
                "skill name",
            )?;
        }
        DepartmentCommand::SetSkill {
            target,
            skill_index,
        } => {
            form.begin_edit_at(departments, target.index).await?;
            applied(
                form.update_field(
                    FieldPath::Skill {
                        employee: target.employee,
                        skill: skill_index,
                    },
                    target.skill,
                )?,
                "skill name",
            )?;
        }
    }

    print_json(&form.submit(departments).await?)
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
    }
    debug!(api_base_url = %settings.api_base_url, "loaded settings");
    let client = CrudClient::new(settings)?;

    match cli.command {
        Command::Posts(command) => run_posts(&client, command).await,
        Command::Departments(command) => run_departments(&client, command).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        match err.downcast_ref::<ClientError>() {
            Some(client_err) if client_err.is_network() => {
                eprintln!("{}", user_facing_message(client_err))
            }
            _ => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
