//! Command dispatch: one handler per subcommand.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::{debug, instrument};

use crate::application::services::cube::SentencePart;
use crate::application::services::{Census, Framework, Scenario};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{validate, DomainError};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::{InfraError, ServiceContainer};
use crate::render::panels::{overview_text, reference_text, statistics_text};
use crate::render::{DepthFilter, NodeEvent, PanelKind, TreeKey, ViewMode};

/// Run the parsed command line. Completion is handled by the binary.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `skillmix --help`".to_string(),
        ));
    };

    if let Commands::Config { command } = command {
        return config_command(cli.data_dir.as_deref(), command);
    }

    let settings = Settings::load(cli.data_dir.as_deref())?;
    debug!("execute_command: data_dir={}", settings.data_dir.display());
    let container = ServiceContainer::new(settings)?;

    match command {
        Commands::Show {
            dimension,
            view,
            expand,
            expand_all,
            keys,
            search,
            depth,
            metadata,
            references,
            html,
        } => show(
            &container,
            dimension,
            ShowOptions {
                view: view.as_deref(),
                expand,
                expand_all: *expand_all,
                keys,
                search: search.as_deref(),
                depth: *depth,
                metadata: *metadata,
                references: *references,
                html: *html,
            },
        ),
        Commands::Panels {
            dimension,
            panel,
            html,
        } => panels(&container, dimension, *panel, *html),
        Commands::Export { dimension, output } => export(&container, dimension, output.as_deref()),
        Commands::Validate { dimension } => validate_dimension(&container, dimension),
        Commands::Count => count(&container),
        Commands::Cube {
            select,
            no_defaults,
            interactive,
            html,
        } => cube(&container, select, !*no_defaults, *interactive, *html),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

struct ShowOptions<'a> {
    view: Option<&'a str>,
    expand: &'a [String],
    expand_all: bool,
    keys: &'a [String],
    search: Option<&'a str>,
    depth: DepthFilter,
    metadata: Option<bool>,
    references: bool,
    html: bool,
}

#[instrument(level = "debug", skip(container, opts))]
fn show(container: &ServiceContainer, dimension: &str, opts: ShowOptions<'_>) -> CliResult<()> {
    let mut explorer = container.explorer();
    if let Some(view) = opts.view {
        explorer.set_view_mode(view.parse::<ViewMode>().unwrap_or_default());
    }
    if let Some(show) = opts.metadata {
        explorer.set_show_metadata(show);
    }
    if opts.references {
        explorer.set_show_references(true);
    }

    if let Err(e) = explorer.try_select_dimension(dimension) {
        if opts.html {
            output::info(&explorer.render_html());
        } else {
            output::error(&explorer.render_text());
        }
        return Err(e.into());
    }

    let tree_requested = opts.expand_all || !opts.expand.is_empty() || !opts.keys.is_empty();
    if let Some(tree) = explorer.tree_mut() {
        if opts.expand_all {
            tree.expand_all();
        }
        for id in opts.expand {
            tree.reveal(id).map_err(ApplicationError::from)?;
            tree.expand(id).map_err(ApplicationError::from)?;
        }
        for key in opts.keys {
            let key: TreeKey = key.parse().map_err(ApplicationError::from)?;
            let target = tree
                .focused()
                .map(str::to_string)
                .or_else(|| tree.visible_ids().into_iter().next());
            if let Some(target) = target {
                tree.handle(&target, NodeEvent::Key(key))
                    .map_err(ApplicationError::from)?;
            }
        }
        if !opts.keys.is_empty() && !opts.html {
            if let Some(focused) = tree.focused() {
                output::action("Focus", focused);
            }
        }
    } else if tree_requested {
        output::warning("--expand, --expand-all and --key apply to the hierarchy view only");
    }

    if let Some(list) = explorer.list_mut() {
        let visible = list.apply_filter(opts.search.unwrap_or(""), opts.depth);
        debug!("show: list filter left {} of {} rows", visible, list.row_count());
    } else if opts.search.is_some() || opts.depth != DepthFilter::All {
        output::warning("--search and --depth apply to the list view only");
    }

    if opts.html {
        output::info(&explorer.render_html());
    } else {
        output::info(&explorer.render_text());
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn panels(
    container: &ServiceContainer,
    dimension: &str,
    panel: PanelKind,
    html: bool,
) -> CliResult<()> {
    let mut explorer = container.explorer();
    let loaded = explorer.try_select_dimension(dimension)?;

    if html {
        if let Some(panels) = explorer.panels() {
            let rendered = [
                (PanelKind::Overview, &panels.overview),
                (PanelKind::Statistics, &panels.statistics),
                (PanelKind::Reference, &panels.reference),
            ];
            for (kind, element) in rendered {
                if panel.includes(kind) {
                    output::info(&element.render());
                }
            }
        }
        return Ok(());
    }

    if panel.includes(PanelKind::Overview) {
        output::info(&overview_text(&loaded));
    }
    if panel.includes(PanelKind::Statistics) {
        output::info(&statistics_text(&loaded));
    }
    if panel.includes(PanelKind::Reference) {
        output::info(&reference_text(&loaded, explorer.options()));
    }
    Ok(())
}

fn export(
    container: &ServiceContainer,
    dimension: &str,
    output_dir: Option<&Path>,
) -> CliResult<()> {
    let mut explorer = container.explorer();
    explorer.try_select_dimension(dimension)?;

    let dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let written = explorer.export(container.fs.as_ref(), &dir)?;
    output::action("Exported", &written.display());
    Ok(())
}

fn validate_dimension(container: &ServiceContainer, dimension: &str) -> CliResult<()> {
    let loaded = container.loader.load(dimension)?;
    let report = validate(&loaded.document);

    if report.is_valid() {
        output::success(&format!(
            "{}: {} items, no issues",
            dimension, report.items_checked
        ));
        return Ok(());
    }

    output::header(&format!(
        "{}: {} items checked",
        dimension, report.items_checked
    ));
    for issue in &report.issues {
        output::failure(issue);
    }
    Err(CliError::Invalid {
        dimension: dimension.to_string(),
        issues: report.issues.len(),
    })
}

fn count(container: &ServiceContainer) -> CliResult<()> {
    let vocabulary = container.vocabulary()?;
    let census = Census::take(&container.loader, &vocabulary);

    output::info(&census.to_text());
    if census.failures() == census.dimensions.len() {
        return Err(ApplicationError::NothingLoaded.into());
    }
    if census.failures() > 0 {
        output::warning(&format!("{} dimension(s) could not be loaded", census.failures()));
    }
    Ok(())
}

fn cube(
    container: &ServiceContainer,
    select: &[String],
    apply_defaults: bool,
    interactive: bool,
    html: bool,
) -> CliResult<()> {
    let mut cube = container.cube_explorer()?;
    cube.populate(&container.loader, apply_defaults);
    for slot in cube.slots() {
        if let Some(error) = &slot.load_error {
            output::warning(&format!("{}: {}", slot.dimension.label, error));
        }
    }

    for pair in select {
        let (key, id) = pair
            .split_once('=')
            .ok_or_else(|| ApplicationError::from(DomainError::InvalidSelection(pair.clone())))?;
        cube.select(key.trim(), id.trim())
            .map_err(ApplicationError::from)?;
    }

    if interactive {
        cube.choose_interactively(container.selector.as_ref())?;
    }

    let scenario = cube.scenario();
    if html {
        output::info(&cube.dropdowns_html().render());
        output::info(&scenario.to_html().render());
        return Ok(());
    }

    for framework in Framework::ALL {
        output::header(framework.title());
        for slot in cube.slots().iter().filter(|s| s.dimension.framework == framework) {
            let selected = slot
                .selected
                .as_ref()
                .map(|item| item.name.as_str())
                .unwrap_or_default();
            output::field(&slot.dimension.label, selected);
        }
    }
    println!();

    match &scenario {
        Scenario::Complete { parts } => {
            let sentence: String = parts
                .iter()
                .map(|part| match part {
                    SentencePart::Text(text) => text.clone(),
                    SentencePart::Value { text, .. } => text.bold().to_string(),
                })
                .collect();
            output::info(&sentence);
        }
        Scenario::Incomplete { prompt, missing } => {
            output::info(prompt);
            output::field("missing", &missing.join(", "));
        }
    }
    Ok(())
}

fn config_command(data_dir: Option<&Path>, command: &ConfigCommands) -> CliResult<()> {
    let local_dir = data_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(data_dir)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            output::header("Config paths");
            match global_config_path() {
                Some(path) => output::field(
                    "global",
                    &format!("{} {}", path.display(), exists_marker(&path)),
                ),
                None => output::field("global", "(no config directory)"),
            }
            let local = local_config_path(&local_dir);
            output::field(
                "local",
                &format!("{} {}", local.display(), exists_marker(&local)),
            );
        }
        ConfigCommands::Init { global } => {
            let target = if *global {
                global_config_path().ok_or_else(|| ApplicationError::Config {
                    message: "cannot determine global config directory".to_string(),
                })?
            } else {
                local_config_path(&local_dir)
            };
            let fs = RealFileSystem;
            if fs.exists(&target) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    target.display()
                )));
            }
            fs.ensure_parent(&target)
                .map_err(|e| InfraError::io(format!("create {}", target.display()), e))?;
            fs.write(&target, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
            output::success(&format!("Created {}", target.display()));
        }
    }
    Ok(())
}

fn exists_marker(path: &Path) -> &'static str {
    if path.exists() {
        "(exists)"
    } else {
        "(not found)"
    }
}
