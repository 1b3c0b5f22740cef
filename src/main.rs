//! BarcodeVerify - USB barcode scanner daemon and shipment client
//!
//! Run with `barcodeverify` or `barcodeverify daemon` to start scanning.
//! Use `barcodeverify login` once, then `barcodeverify shipment select`
//! to choose what scans are recorded against.

use anyhow::{bail, Context};
use barcodeverify::api::admin::DateRange;
use barcodeverify::api::models::{
    CreateShipmentRequest, Role, Shipment, ShipmentSearch, ShipmentStatus, TransportCompany,
    TransportCompanyInput, User,
};
use barcodeverify::api::shipments::ShipmentFilter;
use barcodeverify::cli::{
    Cli, Commands, ShipmentAction, TransportAction, TransportFields, UsersAction,
};
use barcodeverify::config::{self, Config};
use barcodeverify::credentials::{CredentialStore, Credentials};
use barcodeverify::error::ApiError;
use barcodeverify::report::{ApiReporter, OfflineReporter, ScanReporter};
use barcodeverify::selection::{self, ShipmentRef};
use barcodeverify::{format, ApiClient, Daemon};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("barcodeverify={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    let store = CredentialStore::default_location();

    let command = cli.command.unwrap_or(Commands::Daemon {
        shipment: None,
        manual: false,
        offline: false,
        device: None,
        grab: false,
    });

    // Run the appropriate command
    match command {
        Commands::Daemon {
            shipment,
            manual,
            offline,
            device,
            grab,
        } => {
            if let Some(device) = device {
                config.scanner.devices = vec![device];
            }
            if grab {
                config.scanner.grab = true;
            }
            if manual {
                config.scanner.manual_input = true;
            }
            config.validate()?;
            run_daemon(config, store, shipment, offline).await?;
        }

        Commands::Login { username } => {
            config.validate()?;
            let password = read_password()?;
            let client = ApiClient::new(&config.api);
            let (token, user) = api(&store, client.login(&username, &password))?;
            store.save(&Credentials {
                token,
                user: user.clone(),
            })?;
            println!("Logged in as {} ({})", user.username, user.role);
        }

        Commands::Register {
            username,
            email,
            role,
        } => {
            config.validate()?;
            let role = parse_role(&role)?;
            let password = read_password()?;
            let client = ApiClient::new(&config.api);
            api(&store, client.register(&username, &email, &password, role))?;
            println!("Registered {} ({}). Log in with: barcodeverify login -u {}", username, role, username);
        }

        Commands::Logout => {
            if store.clear()? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }

        Commands::Whoami => {
            config.validate()?;
            let (client, credentials) = authenticated_client(&config, &store)?;
            let credentials = credentials.ok_or(ApiError::NotLoggedIn)?;
            print_user(&credentials.user);
            api(&store, client.verify())?;
            println!("Session: valid ({})", client.base_url());
        }

        Commands::Shipment { action } => {
            config.validate()?;
            run_shipment(&config, &store, action)?;
        }

        Commands::Transport { action } => {
            config.validate()?;
            run_transport(&config, &store, action)?;
        }

        Commands::Users { action } => {
            config.validate()?;
            run_users(&config, &store, action)?;
        }

        Commands::Stats { from, to, report } => {
            config.validate()?;
            run_stats(&config, &store, DateRange { start: from, end: to }, report)?;
        }

        Commands::Config { init } => {
            if init {
                let path = cli
                    .config
                    .clone()
                    .or_else(Config::default_path)
                    .context("Could not determine the config directory")?;
                if config::write_default_config(&path)? {
                    println!("Wrote default config to {:?}", path);
                } else {
                    println!("Config already exists at {:?}", path);
                }
                return Ok(());
            }
            show_config(&config, &store)?;
        }

        Commands::Status { follow, format } => {
            run_status(&config, follow, &format).await?;
        }
    }

    Ok(())
}

/// Convert an API result, discarding the stored session on 401
fn api<T>(store: &CredentialStore, result: Result<T, ApiError>) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            if e.is_unauthorized() {
                if let Err(clear_err) = store.clear() {
                    tracing::warn!("Failed to clear credentials: {}", clear_err);
                }
            }
            tracing::debug!("API error: {}", e);
            bail!("{}", e.user_message())
        }
    }
}

/// Client carrying the stored token, if any
fn authenticated_client(
    config: &Config,
    store: &CredentialStore,
) -> anyhow::Result<(ApiClient, Option<Credentials>)> {
    let credentials = store.load()?;
    let client =
        ApiClient::new(&config.api).with_token(credentials.as_ref().map(|c| c.token.clone()));
    Ok((client, credentials))
}

/// Client for commands only administrators may run
fn admin_client(config: &Config, store: &CredentialStore) -> anyhow::Result<ApiClient> {
    let (client, credentials) = authenticated_client(config, store)?;
    match credentials {
        None => Err(ApiError::NotLoggedIn.into()),
        Some(c) if !c.is_admin() => Err(ApiError::AdminRequired.into()),
        Some(_) => Ok(client),
    }
}

/// Password from BARCODEVERIFY_PASSWORD, else one line of stdin
fn read_password() -> anyhow::Result<String> {
    if let Ok(password) = std::env::var("BARCODEVERIFY_PASSWORD") {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

fn parse_role(role: &str) -> anyhow::Result<Role> {
    role.parse::<Role>().map_err(anyhow::Error::msg)
}

async fn run_daemon(
    config: Config,
    store: CredentialStore,
    shipment: Option<i64>,
    offline: bool,
) -> anyhow::Result<()> {
    let (client, credentials) = authenticated_client(&config, &store)?;

    let reporter: Arc<dyn ScanReporter> = if offline {
        tracing::warn!("Offline mode: scans are logged, not sent to the server");
        Arc::new(OfflineReporter)
    } else {
        if credentials.is_none() {
            bail!("Not logged in. Run 'barcodeverify login' first, or use --offline.");
        }
        Arc::new(ApiReporter::new(client.clone()))
    };

    let shipment = match shipment {
        Some(id) if offline => Some(ShipmentRef::new(id, None)),
        Some(id) => {
            let found = tokio::task::spawn_blocking(move || client.shipment(id)).await?;
            let found = api(&store, found)?;
            if !found.status.is_open() {
                bail!(
                    "Shipment {} is {}; only pending or in-progress shipments can be scanned",
                    found.shipment_number,
                    found.status
                );
            }
            Some(ShipmentRef::new(found.id, Some(found.shipment_number)))
        }
        None => None,
    };

    let mut daemon = Daemon::new(config, reporter)
        .with_shipment(shipment)
        .with_credentials(store);
    daemon.run().await?;
    Ok(())
}

fn run_shipment(
    config: &Config,
    store: &CredentialStore,
    action: ShipmentAction,
) -> anyhow::Result<()> {
    let (client, credentials) = authenticated_client(config, store)?;

    match action {
        ShipmentAction::List {
            all,
            completed,
            cancelled,
        } => {
            let filter = if all {
                ShipmentFilter::All
            } else if completed {
                ShipmentFilter::Completed
            } else if cancelled {
                ShipmentFilter::Cancelled
            } else {
                ShipmentFilter::Active
            };
            let shipments = api(store, client.shipments(filter))?;
            print_shipments(&shipments);
        }

        ShipmentAction::Show { shipment } => {
            // Numeric arguments are IDs; anything else is a shipment number
            let shipment = match shipment.parse::<i64>() {
                Ok(id) => api(store, client.shipment(id))?,
                Err(_) => api(store, client.shipment_by_number(&shipment))?,
            };
            print_shipment(&shipment);
            let products = api(store, client.shipment_products(shipment.id))?;
            println!("\nProducts ({}):", products.len());
            for p in &products {
                println!(
                    "  {:<16} {:<32} x{:<4} {}",
                    p.barcode,
                    p.name,
                    p.quantity,
                    format::relative_time(p.scanned_at.as_deref(), chrono::Utc::now())
                );
            }
        }

        ShipmentAction::Create {
            number,
            transport_company,
            departure,
        } => {
            if let Some(ref d) = departure {
                if format::parse_timestamp(d).is_none() {
                    bail!("Invalid departure date: {}", d);
                }
            }
            let created = api(
                store,
                client.create_shipment(&CreateShipmentRequest {
                    shipment_number: number,
                    transport_company_id: transport_company,
                    estimated_departure: departure,
                }),
            )?;
            println!(
                "Created shipment {} (#{}). Select it with: barcodeverify shipment select {}",
                created.shipment_number, created.id, created.id
            );
        }

        ShipmentAction::Start { number } => {
            api(store, client.start_shipment(&number))?;
            println!("Scanning started for shipment {}", number);
        }

        ShipmentAction::Complete { id } => {
            api(store, client.complete_shipment(id))?;
            println!("Shipment #{} completed", id);
            clear_selection_if(id)?;
        }

        ShipmentAction::Status { id, status } => {
            let status = status
                .parse::<ShipmentStatus>()
                .map_err(anyhow::Error::msg)?;
            api(store, client.update_shipment_status(id, status))?;
            println!("Shipment #{} is now {}", id, status);
            if !status.is_open() {
                clear_selection_if(id)?;
            }
        }

        ShipmentAction::Cancel { id } => {
            match credentials {
                None => return Err(ApiError::NotLoggedIn.into()),
                Some(ref c) if !c.is_admin() => return Err(ApiError::AdminRequired.into()),
                Some(_) => {}
            }
            api(store, client.cancel_shipment(id))?;
            println!("Shipment #{} cancelled", id);
            clear_selection_if(id)?;
        }

        ShipmentAction::Products { id, categories } => {
            if categories {
                for c in api(store, client.shipment_categories(id))? {
                    println!(
                        "{:<24} {}",
                        c.category.as_deref().unwrap_or("(uncategorized)"),
                        c.count
                    );
                }
            } else {
                let products = api(store, client.shipment_products(id))?;
                if products.is_empty() {
                    println!("No products scanned yet");
                }
                for p in &products {
                    println!(
                        "{:<16} {:<32} x{:<4} {:<16} {}",
                        p.barcode,
                        p.name,
                        p.quantity,
                        p.category.as_deref().unwrap_or("-"),
                        format::colombia_time(p.scanned_at.as_deref())
                    );
                }
            }
        }

        ShipmentAction::Product { barcode } => {
            let p = api(store, client.product_by_barcode(&barcode))?;
            println!("Barcode:  {}", p.barcode);
            println!("Name:     {}", p.name);
            println!("Quantity: {}", p.quantity);
            if let Some(ref category) = p.category {
                println!("Category: {}", category);
            }
            if let Some(ref brand) = p.brand {
                println!("Brand:    {}", brand);
            }
            if let Some(ref model) = p.model {
                println!("Model:    {}", model);
            }
            if let Some(ref serial) = p.serial_number {
                println!("Serial:   {}", serial);
            }
            if let Some(id) = p.shipment_id {
                println!("Shipment: #{}", id);
            }
            println!("Scanned:  {}", format::colombia_time(p.scanned_at.as_deref()));
        }

        ShipmentAction::Select { id } => {
            let shipment = api(store, client.shipment(id))?;
            if !shipment.status.is_open() {
                bail!(
                    "Shipment {} is {}; only pending or in-progress shipments can be scanned",
                    shipment.shipment_number,
                    shipment.status
                );
            }
            let selected = ShipmentRef::new(shipment.id, Some(shipment.shipment_number));
            selection::save(&selection::selection_path(), &selected)?;
            println!("Selected shipment {}", selected);
            if selection::notify_daemon() {
                println!("Running daemon notified");
            } else {
                println!("Daemon not running; the selection applies when it starts");
            }
        }

        ShipmentAction::Clear => {
            selection::clear(&selection::selection_path())?;
            selection::notify_daemon();
            println!("Shipment selection cleared");
        }

        ShipmentAction::Search {
            status,
            number,
            from,
            to,
        } => {
            let status = status
                .map(|s| s.parse::<ShipmentStatus>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let search = ShipmentSearch {
                status,
                shipment_number: number,
                date_from: from,
                date_to: to,
            };
            print_shipments(&api(store, client.search_shipments(&search))?);
        }

        ShipmentAction::Stats => {
            let stats = api(store, client.shipment_stats())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

/// Drop the selection when the selected shipment is closed
fn clear_selection_if(id: i64) -> anyhow::Result<()> {
    let path = selection::selection_path();
    if selection::load(&path).map(|s| s.id) == Some(id) {
        selection::clear(&path)?;
        selection::notify_daemon();
        println!("Shipment selection cleared");
    }
    Ok(())
}

fn transport_input(fields: TransportFields) -> TransportCompanyInput {
    TransportCompanyInput {
        name: fields.name,
        driver_name: fields.driver,
        license_plate: fields.plate.to_uppercase(),
        phone: fields.phone,
    }
}

fn run_transport(
    config: &Config,
    store: &CredentialStore,
    action: TransportAction,
) -> anyhow::Result<()> {
    let (client, _) = authenticated_client(config, store)?;

    match action {
        TransportAction::List { all } => {
            print_companies(&api(store, client.transport_companies(!all))?);
        }
        TransportAction::Show { id } => {
            let c = api(store, client.transport_company(id))?;
            print_companies(std::slice::from_ref(&c));
            if let Some(n) = c.total_shipments {
                println!("Shipments: {}", n);
            }
            if let Some(n) = c.total_products {
                println!("Products:  {}", n);
            }
        }
        TransportAction::Create { fields, admin } => {
            let client = if admin {
                admin_client(config, store)?
            } else {
                client
            };
            let created = api(
                store,
                client.create_transport_company(&transport_input(fields), admin),
            )?;
            println!("Created transport company {} (#{})", created.name, created.id);
        }
        TransportAction::Update { id, fields } => {
            api(
                store,
                client.update_transport_company(id, &transport_input(fields)),
            )?;
            println!("Transport company #{} updated", id);
        }
        TransportAction::Delete { id } => {
            api(store, client.delete_transport_company(id))?;
            println!("Transport company #{} deleted", id);
        }
        TransportAction::Toggle { id } => {
            api(store, client.toggle_transport_company(id))?;
            let c = api(store, client.transport_company(id))?;
            println!(
                "Transport company #{} is now {}",
                id,
                if c.is_active { "active" } else { "inactive" }
            );
        }
        TransportAction::Search { plate } => {
            print_companies(&api(store, client.search_transport_by_plate(&plate))?);
        }
    }

    Ok(())
}

fn run_users(config: &Config, store: &CredentialStore, action: UsersAction) -> anyhow::Result<()> {
    let client = admin_client(config, store)?;

    match action {
        UsersAction::List => {
            let users = api(store, client.users())?;
            println!(
                "{:<6} {:<20} {:<28} {:<8} {:<8} Last login",
                "ID", "Username", "Email", "Role", "Active"
            );
            for u in &users {
                println!(
                    "{:<6} {:<20} {:<28} {:<8} {:<8} {}",
                    u.id,
                    u.username,
                    u.email,
                    u.role.to_string(),
                    if u.is_active { "yes" } else { "no" },
                    format::relative_time(u.last_login.as_deref(), chrono::Utc::now())
                );
            }
        }
        UsersAction::Create {
            username,
            email,
            role,
        } => {
            let role = parse_role(&role)?;
            let password = read_password()?;
            api(store, client.create_user(&username, &email, &password, role))?;
            println!("Created user {} ({})", username, role);
        }
        UsersAction::Role { id, role } => {
            let role = parse_role(&role)?;
            api(store, client.set_user_role(id, role))?;
            println!("User #{} is now {}", id, role);
        }
        UsersAction::Activate { id } => {
            api(store, client.set_user_active(id, true))?;
            println!("User #{} activated", id);
        }
        UsersAction::Deactivate { id } => {
            api(store, client.set_user_active(id, false))?;
            println!("User #{} deactivated", id);
        }
    }

    Ok(())
}

fn run_stats(
    config: &Config,
    store: &CredentialStore,
    range: DateRange,
    report: bool,
) -> anyhow::Result<()> {
    let client = admin_client(config, store)?;

    if report {
        let report = api(store, client.shipment_report(&range))?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = api(store, client.dashboard_stats(&range))?;
    // Quick stats are optional; the dashboard still renders without them
    let quick = match client.quick_stats() {
        Ok(quick) => Some(quick),
        Err(e) => {
            tracing::debug!("Quick stats unavailable: {}", e);
            None
        }
    };

    println!("Dashboard\n");
    println!(
        "Period: {} - {}",
        format::colombia_time(stats.period.start.as_deref()),
        format::colombia_time(stats.period.end.as_deref())
    );

    println!("\n[summary]");
    println!("  shipments          = {}", stats.summary.total_shipments);
    println!("  products scanned   = {}", stats.summary.total_products_scanned);
    println!("  active users       = {}", stats.summary.total_users_active);
    println!(
        "  products/shipment  = {:.1}",
        stats.summary.avg_products_per_shipment
    );
    println!("  completed          = {}", stats.status_count("Completed"));
    println!("  in progress        = {}", stats.status_count("InProgress"));
    println!("  pending            = {}", stats.status_count("Pending"));

    if let Some(quick) = quick {
        println!("\n[today]");
        println!("  shipments          = {}", quick.today.shipments);
        println!("  products scanned   = {}", quick.today.products_scanned);
        println!("\n[system]");
        println!("  active users       = {}", quick.system.active_users);
        println!("  pending shipments  = {}", quick.system.pending_shipments);
        println!("  in progress        = {}", quick.system.in_progress_shipments);
    }

    if !stats.top_transport_companies.is_empty() {
        println!("\n[top transport companies]");
        for c in &stats.top_transport_companies {
            println!(
                "  {:<24} {:>5} shipments {:>7} products",
                c.company_name, c.shipment_count, c.product_count
            );
        }
    }

    if !stats.top_users.is_empty() {
        println!("\n[top users]");
        for u in &stats.top_users {
            println!(
                "  {:<20} {:>5} scans {:>7} products  last {}",
                u.username,
                u.scan_count,
                u.total_products_scanned,
                format::relative_time(u.last_scan.as_deref(), chrono::Utc::now())
            );
        }
    }

    if !stats.top_products.is_empty() {
        println!("\n[top products]");
        for p in &stats.top_products {
            println!(
                "  {:<16} {:<28} {:>6} units",
                p.barcode, p.name, p.total_quantity
            );
        }
    }

    if !stats.daily_activity.is_empty() {
        println!("\n[daily activity]");
        for d in &stats.daily_activity {
            println!(
                "  {:<12} {:>5} operations {:>7} products",
                d.date, d.scan_operations, d.products_scanned
            );
        }
    }

    Ok(())
}

fn print_user(user: &User) {
    println!("User:       {} (#{})", user.username, user.id);
    println!("Email:      {}", user.email);
    println!("Role:       {}", user.role);
    println!("Active:     {}", if user.is_active { "yes" } else { "no" });
    println!(
        "Last login: {}",
        format::relative_time(user.last_login.as_deref(), chrono::Utc::now())
    );
}

fn print_shipments(shipments: &[Shipment]) {
    if shipments.is_empty() {
        println!("No shipments");
        return;
    }
    let selected = selection::load(&selection::selection_path()).map(|s| s.id);
    println!(
        "  {:<6} {:<18} {:<12} {:>8}  {:<22} Created",
        "ID", "Number", "Status", "Products", "Carrier"
    );
    for s in shipments {
        let marker = if selected == Some(s.id) { '*' } else { ' ' };
        println!(
            "{} {:<6} {:<18} {:<12} {:>8}  {:<22} {}",
            marker,
            s.id,
            s.shipment_number,
            s.status.to_string(),
            s.product_count,
            s.transport_company
                .as_ref()
                .map(|c| c.name.as_str())
                .unwrap_or("-"),
            format::relative_time(s.created_at.as_deref(), chrono::Utc::now())
        );
    }
}

fn print_shipment(s: &Shipment) {
    println!("Shipment:   {} (#{})", s.shipment_number, s.id);
    println!("Status:     {}", s.status);
    println!("Products:   {}", s.product_count);
    if let Some(ref c) = s.transport_company {
        println!("Carrier:    {} ({})", c.name, c.license_plate);
        println!("Driver:     {} {}", c.driver_name, c.phone);
    }
    println!("Created:    {}", format::colombia_time(s.created_at.as_deref()));
    println!(
        "Departure:  {} (estimated), {} (actual)",
        format::colombia_time(s.estimated_departure.as_deref()),
        format::colombia_time(s.actual_departure.as_deref())
    );
}

fn print_companies(companies: &[TransportCompany]) {
    if companies.is_empty() {
        println!("No transport companies");
        return;
    }
    println!(
        "{:<6} {:<24} {:<20} {:<10} {:<14} Active",
        "ID", "Name", "Driver", "Plate", "Phone"
    );
    for c in companies {
        println!(
            "{:<6} {:<24} {:<20} {:<10} {:<14} {}",
            c.id,
            c.name,
            c.driver_name,
            c.license_plate,
            c.phone,
            if c.is_active { "yes" } else { "no" }
        );
    }
}

/// Read the daemon state from the state file, optionally following changes
async fn run_status(config: &Config, follow: bool, format: &str) -> anyhow::Result<()> {
    let state_path = match config.resolve_state_file() {
        Some(path) => path,
        None => {
            eprintln!("Error: state_file is not configured.");
            eprintln!();
            eprintln!("To enable status monitoring, add to your config.toml:");
            eprintln!();
            eprintln!("  state_file = \"auto\"");
            std::process::exit(1);
        }
    };

    let print_state = |state: &str| {
        if format == "json" {
            println!("{}", format_state_json(state));
        } else {
            println!("{}", state);
        }
    };

    let read_state = || {
        std::fs::read_to_string(&state_path)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "stopped".to_string())
    };

    let state = read_state();
    print_state(&state);
    if !follow {
        return Ok(());
    }

    // Follow mode: watch for changes
    use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        NotifyConfig::default().with_poll_interval(Duration::from_millis(100)),
    )?;

    // Watch the parent directory (file may not exist yet)
    if let Some(parent) = state_path.parent() {
        std::fs::create_dir_all(parent)?;
        watcher.watch(parent, RecursiveMode::NonRecursive)?;
    }

    let mut last_state = state;

    loop {
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(Ok(_event)) => {
                let new_state = read_state();
                if new_state != last_state {
                    print_state(&new_state);
                    last_state = new_state;
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Watch error: {:?}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                // Daemon stopped without a final write
                if !state_path.exists() && last_state != "stopped" {
                    print_state("stopped");
                    last_state = "stopped".to_string();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}

/// Format state as JSON for Waybar consumption
fn format_state_json(state: &str) -> String {
    let (text, class, tooltip) = match state {
        "accumulating" => ("▮▯▮", "accumulating", "Reading barcode..."),
        "idle" => ("▮▮▮", "idle", "BarcodeVerify ready - scan a label"),
        "stopped" => ("", "stopped", "BarcodeVerify not running"),
        _ => ("?", "unknown", "Unknown state"),
    };

    serde_json::json!({
        "text": text,
        "class": class,
        "tooltip": tooltip,
    })
    .to_string()
}

/// Show current configuration
fn show_config(config: &Config, store: &CredentialStore) -> anyhow::Result<()> {
    println!("Current Configuration\n");
    println!("=====================\n");

    println!("[scanner]");
    println!("  enabled = {}", config.scanner.enabled);
    println!("  devices = {:?}", config.scanner.devices);
    println!("  grab = {}", config.scanner.grab);
    println!("  min_length = {}", config.scanner.min_length);
    println!(
        "  inter_key_timeout_ms = {}",
        config.scanner.inter_key_timeout_ms
    );
    println!("  cooldown_ms = {}", config.scanner.cooldown_ms);
    println!("  terminator = {:?}", config.scanner.terminator);
    println!("  manual_input = {}", config.scanner.manual_input);

    println!("\n[api]");
    println!("  base_url = {:?}", config.api.base_url);
    println!("  timeout_secs = {}", config.api.timeout_secs);

    println!("\n[feedback]");
    println!("  enabled = {}", config.feedback.enabled);
    println!("  theme = {:?}", config.feedback.theme);
    println!("  volume = {}", config.feedback.volume);

    println!("\n[notification]");
    println!("  on_scan = {}", config.notification.on_scan);
    println!("  on_duplicate = {}", config.notification.on_duplicate);
    println!("  on_error = {}", config.notification.on_error);

    if let Some(ref state_file) = config.state_file {
        println!("\n[integration]");
        println!("  state_file = {:?}", state_file);
        if let Some(resolved) = config.resolve_state_file() {
            println!("  (resolves to: {:?})", resolved);
        }
    }

    println!("\n---");
    println!(
        "Config file: {:?}",
        Config::default_path().unwrap_or_else(|| PathBuf::from("(not found)"))
    );
    println!("Credentials: {:?}", store.path());
    match selection::load(&selection::selection_path()) {
        Some(shipment) => println!("Selected shipment: {}", shipment),
        None => println!("Selected shipment: (none)"),
    }

    if let Err(e) = config.validate() {
        println!("\nWarning: {}", e);
    }

    Ok(())
}
