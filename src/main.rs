use clap::Parser;
use crudkit::application::manage_config::KEYS;
use crudkit::application::{
    init::init, load_menu, open_session, ConfigService, CrudChildController, CrudController,
};
use crudkit::cli::{parse_assignments, Cli, Commands, RecordView, Renderable, RowsView};
use crudkit::domain::highlight::Highlighter;
use crudkit::domain::{ControlRegistry, FieldBound, ListParams, SelectableList, Session};
use crudkit::error::{CrudError, Result};
use crudkit::infrastructure::url::query_string;
use crudkit::infrastructure::{
    connect, Config, FileSystemWorkspace, ResourceDef, Transport, Workspace,
};
use crudkit::logging;
use serde_json::Value;
use std::io::IsTerminal;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = run(cli);

    match result {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

/// Everything a resource command needs, loaded once.
struct Project {
    config: Config,
    transport: Box<dyn Transport>,
    session: Session,
    registry: ControlRegistry,
}

impl Project {
    fn open() -> Result<Self> {
        let workspace = FileSystemWorkspace::discover()?;
        let config = workspace.load_config()?;
        let transport = connect(&workspace, &config)?;
        let session = open_session(&config, transport.as_ref())?;
        log::info!("session for '{}' opened", session.user());
        Ok(Project {
            config,
            transport,
            session,
            registry: ControlRegistry::with_defaults(),
        })
    }

    fn controller(&self, resource: &str) -> Result<CrudController<'_>> {
        let def = self.config.resource(resource)?;
        CrudController::new(
            def,
            self.transport.as_ref(),
            &self.session,
            &self.registry,
            self.config.page_len,
        )
    }

    /// A child controller when a parent id is given, a plain one otherwise.
    fn target(&self, resource: &str, parent: Option<&str>) -> Result<Target<'_>> {
        let def: &ResourceDef = self.config.resource(resource)?;
        let Some(parent_id) = parent else {
            return Ok(Target::Plain(self.controller(resource)?));
        };
        if def.parent.is_none() {
            return Err(CrudError::InvalidInput(format!(
                "'{}' is not nested under another resource",
                def.name
            )));
        }
        let mut child = CrudChildController::new(
            def,
            self.transport.as_ref(),
            &self.session,
            &self.registry,
            self.config.page_len,
        )?;
        child.set_parent(parent_id);
        Ok(Target::Child(child))
    }
}

enum Target<'t> {
    Plain(CrudController<'t>),
    Child(CrudChildController<'t>),
}

impl<'t> Target<'t> {
    fn controller(&self) -> &CrudController<'t> {
        match self {
            Target::Plain(crud) => crud,
            Target::Child(child) => child.controller(),
        }
    }

    fn controller_mut(&mut self) -> &mut CrudController<'t> {
        match self {
            Target::Plain(crud) => crud,
            Target::Child(child) => child.controller_mut(),
        }
    }

    fn list(&mut self, params: ListParams) -> Result<&[Value]> {
        match self {
            Target::Plain(crud) => crud.list(params),
            Target::Child(child) => child.list(params),
        }
    }

    fn create(&mut self) -> Result<&Value> {
        match self {
            Target::Plain(crud) => crud.create(),
            Target::Child(child) => child.create(),
        }
    }
}

/// List parameters with the resource's filter fields filled in for a quick filter.
fn list_params_for(target: &Target<'_>, mut params: ListParams) -> ListParams {
    if params.filter.is_some() && params.filter_by.is_none() {
        params.filter_by = Some(target.controller().filter_by().to_string());
    }
    params
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Init { path, endpoint }) => init(&path, &endpoint),
        Some(Commands::Config { key, value, list }) => {
            let workspace = FileSystemWorkspace::discover()?;
            let service = ConfigService::new(workspace);

            if list {
                let config = service.list()?;
                println!("endpoint = {}", config.endpoint);
                println!("page_len = {}", config.page_len);
                println!("pages_to_show = {}", config.pages_to_show);
                if let Some(secs) = config.timeout_secs {
                    println!("timeout_secs = {}", secs);
                }
                println!("created = {}", config.created.to_rfc3339());
                println!("resources = {}", config.resources.len());
                Ok(())
            } else if let Some(k) = key {
                if let Some(v) = value {
                    service.set(&k, &v)?;
                    println!("Set {} = {}", k, v);
                } else {
                    println!("{}", service.get(&k)?);
                }
                Ok(())
            } else {
                println!("Usage: crudkit config [--list | <key> [<value>]]");
                println!("Valid keys: {}", KEYS.join(", "));
                Ok(())
            }
        }
        Some(Commands::List {
            resource,
            query,
            select,
            parent,
            json,
            link,
        }) => {
            let project = Project::open()?;
            let mut target = project.target(&resource, parent.as_deref())?;
            let params = list_params_for(&target, query.to_list_params());
            let filter = params.filter.clone().unwrap_or_default();
            target.controller_mut().start_from(params);
            target.list(ListParams::default())?;

            let crud = target.controller();
            if json {
                println!("{}", serde_json::to_string_pretty(crud.rows())?);
                return Ok(());
            }

            let mut selection = SelectableList::new(crud.table());
            for id in &select {
                selection.set_selected(id, true);
            }
            let highlighter = Highlighter::new(&filter, "\x1b[1m", "\x1b[0m");
            let view = RowsView {
                selection: if select.is_empty() {
                    None
                } else {
                    Some(&selection)
                },
                highlighter: if std::io::stdout().is_terminal() {
                    Some(&highlighter)
                } else {
                    None
                },
                ..RowsView::new(crud.table(), crud.rows(), &crud.resource().id_attribute)
            };
            print!("{}", view.render());
            println!("{}", crud.pagination(project.config.pages_to_show).render());
            if link {
                println!("?{}", query_string(crud.query_params()));
            }
            Ok(())
        }
        Some(Commands::Count {
            resource,
            query,
            parent,
        }) => {
            let project = Project::open()?;
            let mut target = project.target(&resource, parent.as_deref())?;
            let params = list_params_for(&target, query.to_list_params());
            target.controller_mut().start_from(params);
            target.list(ListParams::default())?;
            match target.controller().collection().state().total() {
                Some(total) => {
                    println!("{}", total);
                    Ok(())
                }
                None => Err(CrudError::Protocol(format!(
                    "no count available for '{}'",
                    resource
                ))),
            }
        }
        Some(Commands::Show { resource, id, json }) => {
            let project = Project::open()?;
            let mut crud = project.controller(&resource)?;
            let record = crud.edit(&id)?.clone();
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                let view = RecordView {
                    schema: crud.form().schema(),
                    record: &record,
                };
                print!("{}", view.render());
            }
            Ok(())
        }
        Some(Commands::Create {
            resource,
            fields,
            parent,
        }) => {
            let changes = parse_assignments(&fields)?;
            let project = Project::open()?;
            let mut target = project.target(&resource, parent.as_deref())?;
            target.create()?;
            let notice = target.controller_mut().save(&changes)?;
            println!("{}", notice.message);
            Ok(())
        }
        Some(Commands::Update {
            resource,
            id,
            fields,
        }) => {
            let changes = parse_assignments(&fields)?;
            let project = Project::open()?;
            let mut crud = project.controller(&resource)?;
            crud.edit(&id)?;
            let notice = crud.save(&changes)?;
            println!("{}", notice.message);
            Ok(())
        }
        Some(Commands::Delete { resource, ids }) => {
            let project = Project::open()?;
            let mut crud = project.controller(&resource)?;

            if let [id] = ids.as_slice() {
                let notice = crud.delete(id)?;
                println!("{}", notice.message);
                return Ok(());
            }

            let table = crud.table().clone();
            let mut selection = SelectableList::new(&table);
            for id in &ids {
                selection.set_selected(id, true);
            }
            let outcome = crud.delete_selected(&selection)?;
            println!(
                "Deleted {} {} record(s)",
                outcome.deleted.len(),
                crud.resource().label()
            );
            for (id, e) in &outcome.failed {
                eprintln!("Failed to delete {}: {}", id, e);
            }
            if outcome.failed.is_empty() {
                Ok(())
            } else {
                Err(CrudError::InvalidInput(format!(
                    "{} of {} deletions failed",
                    outcome.failed.len(),
                    selection.selected().len()
                )))
            }
        }
        Some(Commands::Form { resource }) => {
            let project = Project::open()?;
            let crud = project.controller(&resource)?;
            print!("{}", crud.form().render());
            Ok(())
        }
        Some(Commands::Menu) => {
            let project = Project::open()?;
            let menu = load_menu(&project.config, project.transport.as_ref(), &project.session)?;
            println!("{}", menu.render().trim_end());
            Ok(())
        }
        None => {
            println!("crudkit - CRUD client for REST resources");
            println!("Use --help for usage information");
            Ok(())
        }
    }
}
