//! Command dispatch: routes parsed arguments to services and renders results.

use std::io::Write;
use std::mem;

use clap::CommandFactory;
use clap_complete::Shell;
use tracing::{debug, instrument};

use crate::application::services::{AddSignup, CreateMessage, ListMessages, StarTarget};
use crate::application::ApplicationError;
use crate::cli::args::{
    Cli, Commands, ConfigCommands, MessageCommands, OutputArgs, SignupCommands,
};
use crate::cli::format::{Formatter, OutputFormat};
use crate::cli::{output, CliError, CliResult};
use crate::config::{expand_path, global_config_path, Settings};
use crate::domain::{parse_date, MessageBox, ReadFilter, SignupRef};
use crate::infrastructure::di::ServiceContainer;

/// Load settings, wire the container and execute the parsed command.
pub fn run(cli: &Cli, out: &mut dyn Write) -> CliResult<()> {
    match &cli.command {
        None => {
            write!(out, "{}", Cli::command().render_help())?;
            return Ok(());
        }
        Some(Commands::Completion { shell }) => return write_completions(*shell, out),
        Some(_) => {}
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(path) = &cli.data_file {
        settings.data_file = expand_path(path);
    }
    debug!("data file: {}", settings.data_file.display());

    let container = ServiceContainer::new(settings)?;
    execute_command(cli, &container, out)
}

/// Execute a command against an already wired container.
pub fn execute_command(
    cli: &Cli,
    container: &ServiceContainer,
    out: &mut dyn Write,
) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Signup { command }) => {
            ensure_active(container.settings.components.signups, "Signups")?;
            signup_command(command, container, out)
        }
        Some(Commands::Message { command }) => {
            ensure_active(container.settings.components.messages, "Messages")?;
            message_command(command, container, out)
        }
        Some(Commands::Config { command }) => config_command(command, container, out),
        // written by `run` before settings are loaded
        Some(Commands::Completion { .. }) | None => Ok(()),
    }
}

fn write_completions(shell: Shell, out: &mut dyn Write) -> CliResult<()> {
    clap_complete::generate(shell, &mut Cli::command(), "bpcli", out);
    Ok(())
}

fn ensure_active(enabled: bool, component: &str) -> CliResult<()> {
    if !enabled {
        return Err(ApplicationError::ComponentInactive(component.to_string()).into());
    }
    Ok(())
}

/// Result of a batch after every item was attempted.
///
/// When every item failed with the same kind of error, that error is returned.
/// Otherwise each failure is reported and the batch counts as partial.
fn batch_outcome(mut failures: Vec<(String, ApplicationError)>, total: usize) -> CliResult<()> {
    let Some((_, first)) = failures.first() else {
        return Ok(());
    };
    let same_kind = failures
        .iter()
        .all(|(_, e)| mem::discriminant(e) == mem::discriminant(first));
    if failures.len() == total && same_kind {
        if let Some((_, e)) = failures.drain(..).next() {
            return Err(e.into());
        }
    }
    for (item, e) in &failures {
        output::error(&format!("{} ({})", e, item));
    }
    Err(CliError::Partial {
        failed: failures.len(),
        total,
    })
}

fn formatter(output: &OutputArgs) -> Formatter {
    Formatter::new(&output.format, output.fields.as_deref())
}

// ============================================================
// signup
// ============================================================

fn signup_command(
    command: &SignupCommands,
    container: &ServiceContainer,
    out: &mut dyn Write,
) -> CliResult<()> {
    match command {
        SignupCommands::Add {
            user_login,
            user_email,
            activation_key,
            porcelain,
        } => signup_add(
            container,
            out,
            AddSignup {
                user_login: user_login.clone(),
                user_email: user_email.clone(),
                activation_key: activation_key.clone(),
            },
            *porcelain,
        ),
        SignupCommands::Get { identifier, output } => {
            signup_get(container, out, identifier, output)
        }
        SignupCommands::Delete { ids, yes } => signup_delete(container, out, ids, *yes),
        SignupCommands::Activate { activation_key } => {
            signup_activate(container, out, activation_key)
        }
        SignupCommands::Resend {
            id,
            email,
            activation_key,
        } => signup_resend(container, out, *id, email, activation_key),
        SignupCommands::List { output, number } => signup_list(container, out, output, *number),
    }
}

#[instrument(skip(container, out))]
fn signup_add(
    container: &ServiceContainer,
    out: &mut dyn Write,
    input: AddSignup,
    porcelain: bool,
) -> CliResult<()> {
    let signup = container.signup_service().add(input)?;
    if porcelain {
        output::info(out, &signup.id)?;
    } else {
        output::success(
            out,
            &format!("Successfully added new user signup (ID #{}).", signup.id),
        )?;
    }
    Ok(())
}

#[instrument(skip(container, out))]
fn signup_get(
    container: &ServiceContainer,
    out: &mut dyn Write,
    identifier: &str,
    output_args: &OutputArgs,
) -> CliResult<()> {
    let signup_ref: SignupRef = identifier.parse().map_err(ApplicationError::from)?;
    let signup = container.signup_service().get(&signup_ref)?;
    formatter(output_args).write_one(out, &signup)
}

#[instrument(skip(container, out))]
fn signup_delete(
    container: &ServiceContainer,
    out: &mut dyn Write,
    ids: &[String],
    yes: bool,
) -> CliResult<()> {
    let refs = ids
        .iter()
        .map(|id| id.parse::<SignupRef>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApplicationError::from)?;

    if !yes
        && !container
            .prompter
            .confirm("Are you sure you want to delete the selected signup(s)?")?
    {
        debug!("signup delete: declined");
        output::warning("Aborted, nothing deleted.");
        return Ok(());
    }

    let service = container.signup_service();
    let mut failures = Vec::new();
    for signup_ref in &refs {
        match service.delete(signup_ref) {
            Ok(_) => output::success(out, "Signup deleted.")?,
            Err(e) => failures.push((signup_ref.to_string(), e)),
        }
    }
    batch_outcome(failures, refs.len())
}

#[instrument(skip(container, out))]
fn signup_activate(
    container: &ServiceContainer,
    out: &mut dyn Write,
    activation_key: &str,
) -> CliResult<()> {
    let user = container.signup_service().activate(activation_key)?;
    output::success(
        out,
        &format!("Signup activated, new user (ID #{}).", user.id),
    )?;
    Ok(())
}

#[instrument(skip(container, out))]
fn signup_resend(
    container: &ServiceContainer,
    out: &mut dyn Write,
    id: u64,
    email: &str,
    activation_key: &str,
) -> CliResult<()> {
    container
        .signup_service()
        .resend(id, email, activation_key)?;
    output::success(out, "Email sent successfully.")?;
    Ok(())
}

#[instrument(skip(container, out))]
fn signup_list(
    container: &ServiceContainer,
    out: &mut dyn Write,
    output_args: &OutputArgs,
    number: Option<usize>,
) -> CliResult<()> {
    let signups = container.signup_service().list(number)?;
    let formatter = formatter(output_args);
    if signups.is_empty() && formatter.format() == OutputFormat::Table {
        output::info(out, "No signups found.")?;
        return Ok(());
    }
    formatter.write_list(out, &signups)
}

// ============================================================
// message
// ============================================================

fn star_target(message_id: Option<u64>, thread_id: Option<u64>) -> CliResult<StarTarget> {
    match (message_id, thread_id) {
        (Some(id), _) => Ok(StarTarget::Message(id)),
        (None, Some(id)) => Ok(StarTarget::Thread(id)),
        (None, None) => Err(CliError::InvalidArgs(
            "either --message-id or --thread-id is required".into(),
        )),
    }
}

fn message_command(
    command: &MessageCommands,
    container: &ServiceContainer,
    out: &mut dyn Write,
) -> CliResult<()> {
    match command {
        MessageCommands::Create {
            from,
            to,
            subject,
            content,
            thread_id,
            date_sent,
            silent,
            porcelain,
        } => {
            let date_sent = date_sent
                .as_deref()
                .map(parse_date)
                .transpose()
                .map_err(ApplicationError::from)?;
            let input = CreateMessage {
                from: from.clone(),
                to: to.clone(),
                subject: subject.clone(),
                content: content.clone(),
                thread_id: *thread_id,
                date_sent,
            };
            message_create(container, out, input, *silent, *porcelain)
        }
        MessageCommands::Delete {
            thread_ids,
            user_id,
            yes,
        } => message_delete(container, out, thread_ids, user_id, *yes),
        MessageCommands::Get { message_id, output } => {
            let message = container.message_service().get(*message_id)?;
            formatter(output).write_one(out, &message)
        }
        MessageCommands::List {
            user_id,
            mailbox,
            kind,
            search,
            count,
            output,
        } => {
            let query = ListMessages {
                user: user_id.clone(),
                mailbox: MessageBox::parse_or_default(mailbox),
                filter: ReadFilter::parse_or_default(kind),
                search: search.clone(),
                count: count.unwrap_or(container.settings.list_count),
            };
            message_list(container, out, query, output)
        }
        MessageCommands::Generate { thread_id, count } => {
            let count = count.unwrap_or(container.settings.generate_count);
            message_generate(container, out, *thread_id, count)
        }
        MessageCommands::Star {
            message_id,
            thread_id,
            user_id,
        } => {
            let target = star_target(*message_id, *thread_id)?;
            let service = container.message_service();
            let user = service.resolve_user(user_id)?;
            service.star(target, &user)?;
            output::success(out, "Message was successfully starred.")?;
            Ok(())
        }
        MessageCommands::Unstar {
            message_id,
            thread_id,
            user_id,
        } => {
            let target = star_target(*message_id, *thread_id)?;
            let service = container.message_service();
            let user = service.resolve_user(user_id)?;
            service.unstar(target, &user)?;
            output::success(out, "Message was successfully unstarred.")?;
            Ok(())
        }
        MessageCommands::Send { subject, content } => {
            container
                .message_service()
                .send_notice(subject.clone(), content.clone())?;
            output::success(out, "Notice was successfully sent.")?;
            Ok(())
        }
    }
}

#[instrument(skip(container, out))]
fn message_create(
    container: &ServiceContainer,
    out: &mut dyn Write,
    input: CreateMessage,
    silent: bool,
    porcelain: bool,
) -> CliResult<()> {
    let message = container.message_service().create(input)?;
    if silent {
        return Ok(());
    }
    if porcelain {
        output::info(out, &message.thread_id)?;
    } else {
        output::success(out, "Message successfully created.")?;
    }
    Ok(())
}

#[instrument(skip(container, out))]
fn message_delete(
    container: &ServiceContainer,
    out: &mut dyn Write,
    thread_ids: &[u64],
    user_id: &str,
    yes: bool,
) -> CliResult<()> {
    let service = container.message_service();
    let user = service.resolve_user(user_id)?;

    if !yes
        && !container
            .prompter
            .confirm("Are you sure you want to delete the selected thread(s)?")?
    {
        debug!("message delete: declined");
        output::warning("Aborted, nothing deleted.");
        return Ok(());
    }

    let mut failures = Vec::new();
    for thread_id in thread_ids {
        match service.delete_thread(*thread_id, &user) {
            Ok(()) => output::success(out, "Thread successfully deleted.")?,
            Err(e) => failures.push((format!("thread #{}", thread_id), e)),
        }
    }
    batch_outcome(failures, thread_ids.len())
}

#[instrument(skip(container, out))]
fn message_list(
    container: &ServiceContainer,
    out: &mut dyn Write,
    query: ListMessages,
    output_args: &OutputArgs,
) -> CliResult<()> {
    let messages = container.message_service().list(query)?;
    formatter(output_args).write_list(out, &messages)
}

#[instrument(skip(container, out))]
fn message_generate(
    container: &ServiceContainer,
    out: &mut dyn Write,
    thread_id: Option<u64>,
    count: usize,
) -> CliResult<()> {
    let generated = container.message_service().generate(
        count,
        thread_id,
        &mut |done, total| {
            if let Err(e) = output::progress("Generating messages", done, total) {
                debug!("progress line not written: {}", e);
            }
        },
    )?;
    output::success(out, &format!("{} messages generated.", generated))?;
    Ok(())
}

// ============================================================
// config
// ============================================================

fn config_command(
    command: &ConfigCommands,
    container: &ServiceContainer,
    out: &mut dyn Write,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            write!(out, "{}", container.settings.to_toml()?)?;
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".into());
            writeln!(out, "config: {}", global)?;
            writeln!(out, "data:   {}", container.settings.data_file.display())?;
            writeln!(out, "outbox: {}", container.settings.outbox_file.display())?;
        }
    }
    Ok(())
}
