use std::path::PathBuf;

use admin::models::{
    Club, ClubDraft, NewRole, NewUser, NewUserClub, NewUserType, Registration, Role, RolePatch,
    User, UserClub, UserClubPatch, UserPatch, UserType, UserTypePatch,
};
use admin::{
    ApiClient, AuthService, ControllerError, Resource, ResourceController, SessionState,
    load_profile, memberships::resolve_club, user_clubs_controller,
};
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use common::{ClientConfig, SessionGuard, open_store};
use tracing::info;

#[derive(Parser)]
#[command(name = "clubadmin", version, about = "Club administration console")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend URL, overriding the configuration
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        email: String,
        #[arg(long, env = "CLUBADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Create an account
    Register(RegisterArgs),
    /// Show the stored session
    Whoami,
    /// Show your user record and club memberships
    Profile,
    /// Manage users
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage roles
    Roles {
        #[command(subcommand)]
        command: RoleCommands,
    },
    /// Manage user types
    UserTypes {
        #[command(subcommand)]
        command: UserTypeCommands,
    },
    /// Manage clubs
    Clubs {
        #[command(subcommand)]
        command: ClubCommands,
    },
    /// Manage the club memberships of a user
    Memberships {
        #[command(subcommand)]
        command: MembershipCommands,
    },
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "CLUBADMIN_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    user_type_id: String,
    #[arg(long, default_value = "")]
    role_id: String,
    /// Club id to join, repeatable
    #[arg(long = "club")]
    clubs: Vec<String>,
}

#[derive(Subcommand)]
enum UserCommands {
    List,
    Create {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CLUBADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        role_id: String,
        #[arg(long)]
        user_type_id: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        role_id: Option<String>,
        #[arg(long)]
        user_type_id: Option<String>,
    },
    /// Deactivate a user
    Block { id: String },
    /// Reactivate a user
    Unblock { id: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum RoleCommands {
    List,
    Create {
        name: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum UserTypeCommands {
    List,
    Create { name: String },
    Edit { id: String, name: String },
    Delete { id: String },
}

#[derive(Args)]
struct ClubFields {
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Logo URL or data-URL
    #[arg(long)]
    logo: Option<String>,
}

impl ClubFields {
    fn apply(self, draft: &mut ClubDraft) {
        let fields = [
            (self.description, &mut draft.description),
            (self.address, &mut draft.address),
            (self.phone, &mut draft.phone),
            (self.email, &mut draft.email),
            (self.logo, &mut draft.logo),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(Subcommand)]
enum ClubCommands {
    List,
    Create {
        name: String,
        #[command(flatten)]
        fields: ClubFields,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ClubFields,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum MembershipCommands {
    List {
        /// User id, defaults to the logged-in user
        #[arg(long)]
        user: Option<String>,
    },
    Add {
        /// Club id or name
        club: String,
        member_number: String,
        #[arg(long)]
        user: Option<String>,
    },
    Edit {
        club: String,
        member_number: String,
        #[arg(long)]
        user: Option<String>,
    },
    Remove {
        club: String,
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(server) = cli.server {
        config.base_url = server.trim_end_matches('/').to_string();
    }

    let store = open_store(&config);
    let client = ApiClient::from_config(&config, store).context("Failed to build HTTP client")?;
    let auth = AuthService::new(client.clone());
    let guard = auth.guard().clone();

    match cli.command {
        Commands::Login { email, password } => {
            let identity = auth.login(&email, &password).await?;
            println!(
                "Logged in as {} (session expires {})",
                identity.email.as_deref().unwrap_or(&identity.user_id),
                identity.expires_at
            );
        }
        Commands::Logout => {
            auth.logout()?;
            println!("Logged out");
        }
        Commands::Register(args) => {
            let registration = Registration {
                email: args.email,
                password: args.password,
                first_name: args.first_name,
                last_name: args.last_name,
                role_id: args.role_id,
                user_type_id: args.user_type_id,
                clubs: args.clubs,
            };
            auth.register(&registration).await?;
            println!("Registered {}", registration.email);
        }
        Commands::Whoami => match auth.whoami() {
            Some(identity) => {
                println!("User:    {}", identity.user_id);
                println!("Email:   {}", identity.email.as_deref().unwrap_or("-"));
                println!("Expires: {}", identity.expires_at);
            }
            None => println!("Not logged in"),
        },
        Commands::Profile => {
            let profile = auth.profile().await?;
            println!("Name:   {}", profile.user.full_name());
            println!("Email:  {}", profile.user.email);
            println!("Active: {}", profile.user.is_active);
            println!();
            print_memberships(&profile.memberships);
        }
        Commands::Users { command } => cmd_users(client, &guard, command).await?,
        Commands::Roles { command } => cmd_roles(client, &guard, command).await?,
        Commands::UserTypes { command } => cmd_user_types(client, &guard, command).await?,
        Commands::Clubs { command } => cmd_clubs(client, &guard, command).await?,
        Commands::Memberships { command } => cmd_memberships(client, &guard, command).await?,
    }

    Ok(())
}

/// Turn a failed controller operation into the message the screen shows
async fn checked<R: Resource, T>(
    controller: &ResourceController<R>,
    result: Result<T, ControllerError>,
) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            let state = controller.snapshot().await;
            let shown = state
                .form_error
                .or(state.error)
                .unwrap_or_else(|| e.to_string());
            if state.session == SessionState::RedirectToLogin {
                bail!("{} (run `clubadmin login`)", shown);
            }
            Err(anyhow::Error::new(e).context(shown))
        }
    }
}

/// Mount a controller through the session guard
async fn mounted<R: Resource>(
    controller: ResourceController<R>,
    guard: &SessionGuard,
) -> Result<ResourceController<R>> {
    checked(&controller, controller.mount(Some(guard)).await).await?;
    Ok(controller)
}

async fn create<R: Resource>(controller: &ResourceController<R>, draft: R::Draft) -> Result<()> {
    controller.open_create().await;
    checked(controller, controller.submit_create(draft).await).await?;
    info!("Created {}", R::LABEL);
    Ok(())
}

async fn edit<R: Resource>(
    controller: &ResourceController<R>,
    id: &str,
    patch: R::Patch,
) -> Result<()> {
    controller.open_edit(id).await;
    checked(controller, controller.submit_edit(patch).await).await?;
    info!("Updated {} {}", R::LABEL, id);
    Ok(())
}

async fn delete<R: Resource>(controller: &ResourceController<R>, id: &str) -> Result<()> {
    controller.open_delete_confirm(id).await;
    checked(controller, controller.confirm_delete().await).await?;
    info!("Deleted {} {}", R::LABEL, id);
    Ok(())
}

async fn cmd_users(client: ApiClient, guard: &SessionGuard, command: UserCommands) -> Result<()> {
    let users = mounted(ResourceController::<User>::new(client), guard).await?;

    match command {
        UserCommands::List => {}
        UserCommands::Create {
            email,
            password,
            first_name,
            last_name,
            role_id,
            user_type_id,
        } => {
            let draft = NewUser {
                email,
                password,
                first_name,
                last_name,
                role_id,
                user_type_id,
            };
            create(&users, draft).await?;
        }
        UserCommands::Edit {
            id,
            first_name,
            last_name,
            role_id,
            user_type_id,
        } => {
            let patch = UserPatch {
                first_name,
                last_name,
                role_id,
                user_type_id,
                is_active: None,
            };
            edit(&users, &id, patch).await?;
        }
        UserCommands::Block { id } => {
            checked(&users, users.apply_patch(&id, UserPatch::active(false)).await).await?;
        }
        UserCommands::Unblock { id } => {
            checked(&users, users.apply_patch(&id, UserPatch::active(true)).await).await?;
        }
        UserCommands::Remove { id } => delete(&users, &id).await?,
    }

    let items = users.snapshot().await.items;
    println!("{:26} {:32} {:28} ACTIVE", "ID", "EMAIL", "NAME");
    for user in &items {
        println!(
            "{:26} {:32} {:28} {}",
            user.id,
            user.email,
            user.full_name(),
            if user.is_active { "yes" } else { "no" }
        );
    }
    Ok(())
}

async fn cmd_roles(client: ApiClient, guard: &SessionGuard, command: RoleCommands) -> Result<()> {
    let roles = mounted(ResourceController::<Role>::new(client), guard).await?;

    match command {
        RoleCommands::List => {}
        RoleCommands::Create { name } => create(&roles, NewRole::new(&name)).await?,
        RoleCommands::Edit { id, name, active } => {
            let patch = RolePatch {
                name: name.map(|n| n.trim().to_string()),
                is_active: active,
            };
            edit(&roles, &id, patch).await?;
        }
        RoleCommands::Delete { id } => delete(&roles, &id).await?,
    }

    let items = roles.snapshot().await.items;
    println!("{:26} {:24} ACTIVE", "ID", "NAME");
    for role in &items {
        println!(
            "{:26} {:24} {}",
            role.id,
            role.name,
            if role.is_active { "yes" } else { "no" }
        );
    }
    Ok(())
}

async fn cmd_user_types(
    client: ApiClient,
    guard: &SessionGuard,
    command: UserTypeCommands,
) -> Result<()> {
    let types = mounted(ResourceController::<UserType>::new(client), guard).await?;

    match command {
        UserTypeCommands::List => {}
        UserTypeCommands::Create { name } => create(&types, NewUserType { name }).await?,
        UserTypeCommands::Edit { id, name } => {
            edit(&types, &id, UserTypePatch { name: Some(name) }).await?
        }
        UserTypeCommands::Delete { id } => delete(&types, &id).await?,
    }

    let items = types.snapshot().await.items;
    println!("{:26} NAME", "ID");
    for user_type in &items {
        println!("{:26} {}", user_type.id, user_type.name);
    }
    Ok(())
}

async fn cmd_clubs(client: ApiClient, guard: &SessionGuard, command: ClubCommands) -> Result<()> {
    let clubs = mounted(ResourceController::<Club>::new(client), guard).await?;

    match command {
        ClubCommands::List => {}
        ClubCommands::Create { name, fields } => {
            let mut draft = ClubDraft::named(name);
            fields.apply(&mut draft);
            create(&clubs, draft).await?;
        }
        ClubCommands::Edit { id, name, fields } => {
            let current = checked(&clubs, clubs.load_for_edit(&id).await).await?;
            let mut draft = ClubDraft::from_club(&current);
            if let Some(name) = name {
                draft.name = name;
            }
            fields.apply(&mut draft);
            checked(&clubs, clubs.submit_edit(draft).await).await?;
            info!("Updated club {}", id);
        }
        ClubCommands::Delete { id } => delete(&clubs, &id).await?,
    }

    let items = clubs.snapshot().await.items;
    println!("{:26} {:28} {:20} EMAIL", "ID", "NAME", "PHONE");
    for club in &items {
        println!(
            "{:26} {:28} {:20} {}",
            club.id,
            club.name,
            club.phone.as_deref().unwrap_or("-"),
            club.email.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn cmd_memberships(
    client: ApiClient,
    guard: &SessionGuard,
    command: MembershipCommands,
) -> Result<()> {
    let identity = guard
        .check()
        .context("A valid session is required (run `clubadmin login`)")?;

    let user = match &command {
        MembershipCommands::List { user }
        | MembershipCommands::Add { user, .. }
        | MembershipCommands::Edit { user, .. }
        | MembershipCommands::Remove { user, .. } => {
            user.clone().unwrap_or_else(|| identity.user_id.clone())
        }
    };

    if let MembershipCommands::List { .. } = command {
        let profile = load_profile(&client, &user)
            .await
            .context("Could not load memberships")?;
        print_memberships(&profile.memberships);
        return Ok(());
    }

    let all_clubs = mounted(ResourceController::<Club>::new(client.clone()), guard).await?;
    let clubs = all_clubs.snapshot().await.items;
    let associations = mounted(user_clubs_controller(client.clone(), &user), guard).await?;

    let find_club = |key: &str| -> Result<String> {
        resolve_club(&clubs, key)
            .map(str::to_string)
            .with_context(|| format!("No club matches \"{}\"", key))
    };

    match command {
        MembershipCommands::List { .. } => {}
        MembershipCommands::Add {
            club,
            member_number,
            ..
        } => {
            let draft = NewUserClub {
                user_id: user.clone(),
                club_id: find_club(&club)?,
                member_number: member_number.trim().to_string(),
            };
            create(&associations, draft).await?;
        }
        MembershipCommands::Edit {
            club,
            member_number,
            ..
        } => {
            let id = association_id(&associations, &find_club(&club)?).await?;
            let patch = UserClubPatch {
                member_number: member_number.trim().to_string(),
            };
            edit(&associations, &id, patch).await?;
        }
        MembershipCommands::Remove { club, .. } => {
            let id = association_id(&associations, &find_club(&club)?).await?;
            delete(&associations, &id).await?;
        }
    }

    let profile = load_profile(&client, &user)
        .await
        .context("Could not load memberships")?;
    print_memberships(&profile.memberships);
    Ok(())
}

async fn association_id(
    associations: &ResourceController<UserClub>,
    club_id: &str,
) -> Result<String> {
    associations
        .snapshot()
        .await
        .items
        .into_iter()
        .find(|uc| uc.club_id == club_id)
        .map(|uc| uc.id)
        .with_context(|| format!("The user is not a member of club {}", club_id))
}

fn print_memberships(memberships: &[admin::models::Membership]) {
    if memberships.is_empty() {
        println!("No club memberships");
        return;
    }
    println!("{:26} {:28} MEMBER NUMBER", "CLUB ID", "CLUB");
    for membership in memberships {
        let number = if membership.member_number.is_empty() {
            "-"
        } else {
            membership.member_number.as_str()
        };
        println!(
            "{:26} {:28} {}",
            membership.club.id, membership.club.name, number
        );
    }
}
