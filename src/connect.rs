use crate::args::Cli;
use tdsql::{
    Charset, CliConfig, CommandHistory, ConnectOptions, Format, MysqlDriver, OutputSink,
    QueryExecutor, Result, Session, SessionMode,
};

/// Merge command-line flags over the configuration file and build a
/// connected session. Flags always win.
pub fn create_session(cli: &Cli) -> Result<Session> {
    let config = CliConfig::load(&cli.config)?;
    let conn = config.resolved_connection();
    let ui = config.resolved_ui();

    if cli.no_color || !ui.color {
        colored::control::set_override(false);
    }

    let host = cli
        .host
        .clone()
        .or(conn.host)
        .unwrap_or_else(|| "localhost".to_string());
    let user = cli
        .user
        .clone()
        .or(conn.user)
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "anonymous".to_string());
    let password = cli.password.clone().or(conn.password).unwrap_or_default();
    let database = cli.database.clone().or(conn.database);

    // Config-file charset/mode names go through the same closed-set
    // validation as the flags, before any connection attempt
    let charset = match cli.charset {
        Some(c) => Some(c),
        None => conn.charset.as_deref().map(Charset::from_name).transpose()?,
    };
    let mode = match cli.mode {
        Some(m) => Some(m),
        None => conn.mode.as_deref().map(SessionMode::from_name).transpose()?,
    };

    let header = cli.header || ui.header;
    let format = match cli.format {
        Some(f) => f.to_format(header),
        None => Format::from_name(&ui.format)?.with_header(header),
    };

    let sink = OutputSink::open(cli.output.as_deref())?;

    let options = ConnectOptions {
        host: host.clone(),
        user,
        password,
        database,
        charset,
        mode,
    };
    let executor = QueryExecutor::connect(Box::new(MysqlDriver), options)?;
    let history = CommandHistory::new(ui.history_size);

    Ok(Session::new(executor, format, sink, history, host))
}
