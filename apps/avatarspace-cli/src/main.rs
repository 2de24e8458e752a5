use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use avatarspace_authorizer::{
    AuthorizationEngine, CharacterDescription, RecordingSink, StaticEntitlement,
};
use avatarspace_codec::AvatarUpdate;
use avatarspace_common::{AnimationState, ItemUid, SessionId, UserId};
use avatarspace_inventory::{InventoryRegistry, OwnershipRecord};
use avatarspace_markup::CharacterBuilder;

const BOT: &str = "/assets/models/bot.glb";
const HAT: &str = "/assets/models/hat.glb";

#[derive(Parser)]
#[command(name = "avatarspace-cli", about = "CLI tool for avatarspace operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Encode an avatar update, hex-dump the wire buffer, and decode it back
    Codec {
        /// Session id
        #[arg(long, default_value = "1")]
        id: u16,
        #[arg(short, long, default_value = "0.0")]
        x: f32,
        #[arg(short, long, default_value = "0.0")]
        y: f32,
        #[arg(short, long, default_value = "0.0")]
        z: f32,
        /// Quaternion Y component
        #[arg(long, default_value = "0.0")]
        rotation_y: f32,
        /// Quaternion W component
        #[arg(long, default_value = "1.0")]
        rotation_w: f32,
        /// Animation state wire value
        #[arg(long, default_value = "0")]
        state: u8,
        /// Character selector
        #[arg(long, default_value = "0")]
        character: u16,
    },
    /// Validate a character description against the demo inventory
    Validate {
        /// User requesting validation
        #[arg(short, long, default_value = "alice")]
        user: String,
        /// Character markup payload
        #[arg(short, long)]
        markup: String,
        /// Provision the user with the unique hat first
        #[arg(long)]
        entitled: bool,
    },
    /// Run the ownership-transfer enforcement scenario end to end
    Enforce,
}

/// Demo inventory: an open-access bot model and a unique hat.
fn demo_engine() -> AuthorizationEngine {
    let mut registry = InventoryRegistry::new();
    let mut bot = OwnershipRecord::for_asset(BOT, false);
    bot.set_open_access(true);
    registry.register(bot);
    registry.register(OwnershipRecord::for_asset(HAT, true));
    AuthorizationEngine::new(registry)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("avatarspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("codec: {}", avatarspace_codec::crate_info());
            println!("markup: {}", avatarspace_markup::crate_info());
            println!("inventory: {}", avatarspace_inventory::crate_info());
            println!("authorizer: {}", avatarspace_authorizer::crate_info());
        }
        Commands::Codec {
            id,
            x,
            y,
            z,
            rotation_y,
            rotation_w,
            state,
            character,
        } => {
            let update = AvatarUpdate {
                session_id: SessionId(id),
                position: glam::Vec3::new(x, y, z),
                rotation_y,
                rotation_w,
                state,
                character_id: character,
            };
            let encoded = update.encode();
            let hex: Vec<String> = encoded.iter().map(|b| format!("{b:02x}")).collect();
            println!("Encoded ({} bytes): {}", encoded.len(), hex.join(" "));

            let decoded = AvatarUpdate::decode(&encoded)?;
            println!("Decoded: {}", serde_json::to_string_pretty(&decoded)?);
            match AnimationState::try_from(decoded.state) {
                Ok(named) => println!("Animation state: {named:?}"),
                Err(err) => println!("Animation state: {err}"),
            }
            println!(
                "Rotation error: y={:.2e} w={:.2e} (bound {:.2e})",
                (decoded.rotation_y - rotation_y).abs(),
                (decoded.rotation_w - rotation_w).abs(),
                1.0 / 32767.0
            );
        }
        Commands::Validate {
            user,
            markup,
            entitled,
        } => {
            let mut engine = demo_engine();
            let user = UserId::new(user);
            if entitled {
                engine.provision(&user, &StaticEntitlement::single(HAT))?;
                println!("Provisioned {user} with {HAT}");
            }

            let description = CharacterDescription::from_markup(markup.clone());
            let validated = engine.validate_description(&user, &description)?;
            println!("Input:     {markup}");
            println!(
                "Validated: {}",
                validated.character_markup.as_deref().unwrap_or("")
            );
            println!(
                "Changed:   {}",
                if validated == description { "no" } else { "yes" }
            );
        }
        Commands::Enforce => {
            let mut engine = demo_engine();
            let sink = RecordingSink::new();
            engine.set_update_sink(Box::new(sink.clone()));

            let alice = UserId::from("alice");
            let bob = UserId::from("bob");

            engine.provision(&alice, &StaticEntitlement::single(HAT))?;
            println!("1. Provisioned alice with the unique hat");

            let markup = CharacterBuilder::new().base(BOT).part(HAT).build_markup();
            let description = CharacterDescription::from_markup(markup);
            let validated = engine.validate_description(&alice, &description)?;
            println!(
                "2. Alice validated her character: {}",
                validated.character_markup.as_deref().unwrap_or("")
            );

            engine.transfer(&ItemUid::from(HAT), &bob)?;
            println!("3. Transferred the hat to bob");

            for (user, description) in sink.pushes() {
                println!(
                    "4. Pushed corrected description for {user}: {:?}",
                    description.character_markup.as_deref().unwrap_or("")
                );
            }
            println!(
                "Sink pushes: {} (expected exactly 1)",
                sink.push_count()
            );
        }
    }

    Ok(())
}
