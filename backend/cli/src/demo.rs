//! Demo command set for the console.
//!
//! A toy economy and quest book kept in memory, enough to exercise every
//! gate and argument type the pipeline offers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argot_commands::{
    CommandContext, CommandDescriptor, CommandHandler, CommandInvocation, CommandPattern,
    CommandRegistry, CommandResponse, PatternSpec, PropertyRule, PropertySchema, Value,
};
use argot_core::testing::MemoryEntities;
use argot_core::{EntityId, PermissionLevel};
use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;

const DAILY_PAYOUT: i64 = 100;
const GUESS_ATTEMPTS: usize = 3;
const GUESS_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// Participants the console knows about.
pub fn demo_entities() -> MemoryEntities {
    let entities = MemoryEntities::new();
    entities
        .insert(1, "Ada")
        .insert(2, "Grace")
        .insert(3, "Linus")
        .insert_inactive(4, "Ghost");
    entities
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quest {
    pub name: String,
    pub attack: f64,
    pub strength: f64,
    pub accuracy: f64,
    pub hp: f64,
    pub task: Option<String>,
    pub channel: Option<String>,
    pub image: Option<String>,
    pub spawn_chance: f64,
}

#[derive(Debug, Default)]
pub struct DemoState {
    balances: Mutex<HashMap<EntityId, i64>>,
    quests: Mutex<HashMap<String, Quest>>,
}

impl DemoState {
    pub async fn balance(&self, entity: EntityId) -> i64 {
        self.balances.lock().await.get(&entity).copied().unwrap_or(0)
    }

    async fn credit(&self, entity: EntityId, amount: i64) -> i64 {
        let mut balances = self.balances.lock().await;
        let balance = balances.entry(entity).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    pub async fn quest(&self, name: &str) -> Option<Quest> {
        self.quests.lock().await.get(&name.to_lowercase()).cloned()
    }
}

/// Register the demo commands over a shared state.
pub fn register_demo(registry: &mut CommandRegistry, state: Arc<DemoState>) -> Result<()> {
    let quest_slots = PatternSpec::parse("SRRRRS?S?L?%?")?.with_default(8, Value::Percentage(25.0))?;
    let quest_properties = PropertySchema::new(
        &[],
        &[
            ("attack/atk", "R"),
            ("strength/strg", "R"),
            ("accuracy/accy", "R"),
            ("hp", "R"),
            ("task", "S"),
            ("channel", "S"),
            ("image/img", "L"),
            ("spawn", "%"),
        ],
    )?
    .with_rule("hp", PropertyRule::at_least(30.0))?
    .with_rule("spawn", PropertyRule::between(0.0, 25.0))?;

    let commands: Vec<(CommandDescriptor, Arc<dyn CommandHandler>)> = vec![
        (
            CommandDescriptor::new("daily")
                .cooldown(Duration::from_secs(86_400), "You can collect again in **[COOLDOWN]**!")
                .help("Collect your daily payout."),
            Arc::new(Daily(state.clone())),
        ),
        (
            CommandDescriptor::new("balance")
                .alias("bal")
                .pattern("P?")?
                .help("[CMD_KEY]balance (player) shows someone else's balance."),
            Arc::new(Balance(state.clone())),
        ),
        (
            CommandDescriptor::new("resetme").confirm("This will **__permanently__** reset your user!"),
            Arc::new(ResetMe(state.clone())),
        ),
        (
            CommandDescriptor::new("award")
                .permission(PermissionLevel::Mod)
                .pattern("IP*")?
                .help("[CMD_KEY]award (amount) (player)... gives every listed player the amount."),
            Arc::new(Award(state.clone())),
        ),
        (
            CommandDescriptor::new("createquest")
                .permission(PermissionLevel::ScopeAdmin)
                .with_pattern(CommandPattern::Positional(quest_slots)),
            Arc::new(CreateQuest(state.clone())),
        ),
        (
            CommandDescriptor::new("editquest")
                .permission(PermissionLevel::ScopeAdmin)
                .properties("S", quest_properties)?
                .help("[CMD_KEY]editquest (quest) hp 50 atk 10 spawn 5%"),
            Arc::new(EditQuest(state.clone())),
        ),
        (
            CommandDescriptor::new("guess").help("Guess a number from 1 to 10."),
            Arc::new(Guess),
        ),
    ];

    for (descriptor, handler) in commands {
        let name = descriptor.name.clone();
        registry
            .register(descriptor, handler)
            .with_context(|| format!("registering demo command `{name}`"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

struct Daily(Arc<DemoState>);

#[async_trait]
impl CommandHandler for Daily {
    async fn handle(&self, ctx: &CommandContext, _inv: &CommandInvocation) -> Result<CommandResponse> {
        let balance = self.0.credit(ctx.invoker, DAILY_PAYOUT).await;
        Ok(CommandResponse::ok(format!("You collected {DAILY_PAYOUT}! Balance: {balance}")))
    }
}

struct Balance(Arc<DemoState>);

#[async_trait]
impl CommandHandler for Balance {
    async fn handle(&self, ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        Ok(match inv.args.entity(0) {
            Some(other) => {
                let balance = self.0.balance(other.id).await;
                CommandResponse::ok(format!("{} has {balance}.", other.name))
            }
            None => CommandResponse::ephemeral(format!("You have {}.", self.0.balance(ctx.invoker).await)),
        })
    }
}

struct ResetMe(Arc<DemoState>);

#[async_trait]
impl CommandHandler for ResetMe {
    async fn handle(&self, ctx: &CommandContext, _inv: &CommandInvocation) -> Result<CommandResponse> {
        self.0.balances.lock().await.remove(&ctx.invoker);
        Ok(CommandResponse::ok("Your user has been reset."))
    }
}

struct Award(Arc<DemoState>);

#[async_trait]
impl CommandHandler for Award {
    async fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let amount = inv.args.integer(0).context("award amount missing")?;
        let mut lines = Vec::new();
        for entity in inv.args.entities_from(1) {
            let balance = self.0.credit(entity.id, amount).await;
            lines.push(format!("{} now has {balance}.", entity.name));
        }
        Ok(CommandResponse::ok(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

struct CreateQuest(Arc<DemoState>);

#[async_trait]
impl CommandHandler for CreateQuest {
    async fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let args = &inv.args;
        let quest = Quest {
            name: args.text(0).context("quest name missing")?.to_string(),
            attack: args.number(1).context("attack missing")?,
            strength: args.number(2).context("strength missing")?,
            accuracy: args.number(3).context("accuracy missing")?,
            hp: args.number(4).context("hp missing")?,
            task: args.text(5).map(str::to_string),
            channel: args.text(6).map(str::to_string),
            image: args.text(7).map(str::to_string),
            spawn_chance: args.number(8).unwrap_or(25.0),
        };
        let reply = format!(
            "Quest **{}** created (atk {}, strg {}, accy {}, hp {}, spawn {}%).",
            quest.name, quest.attack, quest.strength, quest.accuracy, quest.hp, quest.spawn_chance
        );
        self.0.quests.lock().await.insert(quest.name.to_lowercase(), quest);
        Ok(CommandResponse::ok(reply))
    }
}

struct EditQuest(Arc<DemoState>);

#[async_trait]
impl CommandHandler for EditQuest {
    async fn handle(&self, _ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        let name = inv.args.text(0).context("quest name missing")?;
        let mut quests = self.0.quests.lock().await;
        let Some(quest) = quests.get_mut(&name.to_lowercase()) else {
            return Ok(CommandResponse::ephemeral(format!("Quest **{name}** not found!")));
        };

        let mut lines = Vec::new();
        for (property, arg) in &inv.properties.values {
            match (property.as_str(), &arg.value) {
                ("attack", v) => quest.attack = v.as_number().unwrap_or(quest.attack),
                ("strength", v) => quest.strength = v.as_number().unwrap_or(quest.strength),
                ("accuracy", v) => quest.accuracy = v.as_number().unwrap_or(quest.accuracy),
                ("hp", v) => quest.hp = v.as_number().unwrap_or(quest.hp),
                ("spawn", v) => quest.spawn_chance = v.as_number().unwrap_or(quest.spawn_chance),
                ("task", v) => quest.task = v.as_text().map(str::to_string),
                ("channel", v) => quest.channel = v.as_text().map(str::to_string),
                ("image", v) => quest.image = v.as_text().map(str::to_string),
                _ => continue,
            }
            lines.push(format!("✓ {property} → {}", arg.raw.as_deref().unwrap_or("")));
        }
        for invalid in &inv.properties.invalid {
            lines.push(format!("✗ {invalid}"));
        }
        if lines.is_empty() {
            lines.push("Nothing changed.".to_string());
        }
        Ok(CommandResponse::ok(format!("**{}**\n{}", quest.name, lines.join("\n"))))
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

struct Guess;

fn secret_number() -> i64 {
    rand::thread_rng().gen_range(GUESS_RANGE)
}

#[async_trait]
impl CommandHandler for Guess {
    async fn handle(&self, ctx: &CommandContext, _inv: &CommandInvocation) -> Result<CommandResponse> {
        let secret = secret_number();
        for _ in 0..GUESS_ATTEMPTS {
            let Some(reply) = ctx.next_message().await else {
                return Ok(CommandResponse::ok(format!("Too slow! It was {secret}.")));
            };
            match reply.trim().parse::<i64>() {
                Ok(n) if n == secret => return Ok(CommandResponse::ok(format!("Yes, {secret}!"))),
                Ok(n) if n < secret => crate::terminal_output::note_reply("Higher!"),
                Ok(_) => crate::terminal_output::note_reply("Lower!"),
                Err(_) => crate::terminal_output::note_reply("That's not a number."),
            }
        }
        Ok(CommandResponse::ok(format!("Out of guesses! It was {secret}.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argot_commands::{
        CommandDispatcher, DispatchError, DispatcherParts, Invocation, MessageOutcome,
    };
    use argot_core::testing::{FixedLinkProbe, MemoryTeams};
    use argot_core::{ChannelId, ScopeId};

    struct Console {
        dispatcher: CommandDispatcher,
        state: Arc<DemoState>,
        entities: Arc<MemoryEntities>,
    }

    impl Console {
        fn new() -> Self {
            let state = Arc::new(DemoState::default());
            let mut registry = CommandRegistry::new();
            register_demo(&mut registry, state.clone()).unwrap();
            let parts = DispatcherParts::new(
                registry,
                Arc::new(MemoryTeams::new()),
                Arc::new(FixedLinkProbe::new(["https://img.example/mouse.png"])),
            );
            Self {
                dispatcher: CommandDispatcher::new(parts),
                state,
                entities: Arc::new(demo_entities()),
            }
        }

        fn as_entity(&self, id: u64, permission: PermissionLevel) -> Invocation {
            Invocation {
                author: EntityId(id),
                scope: ScopeId(1),
                channel: ChannelId(1),
                permission,
                entities: self.entities.clone(),
            }
        }

        async fn say(&self, inv: &Invocation, text: &str) -> Result<CommandResponse, DispatchError> {
            match self.dispatcher.handle_message(inv, text).await {
                MessageOutcome::Dispatched(result) => result,
                other => panic!("expected a dispatch, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn daily_then_cooldown() {
        let console = Console::new();
        let ada = console.as_entity(1, PermissionLevel::Player);
        assert!(console.say(&ada, "!daily").await.unwrap().text.contains("Balance: 100"));
        let err = console.say(&ada, "!daily").await.unwrap_err();
        assert!(err.user_message().starts_with("You can collect again in **23 hours"));
        assert_eq!(console.state.balance(EntityId(1)).await, 100);
    }

    #[tokio::test]
    async fn award_needs_mod_and_pays_everyone() {
        let console = Console::new();
        let player = console.as_entity(1, PermissionLevel::Player);
        assert!(matches!(
            console.say(&player, "!award 5 2").await,
            Err(DispatchError::PermissionDenied { .. })
        ));

        let moderator = console.as_entity(1, PermissionLevel::Mod);
        console.say(&moderator, "!award 1,000 2 <@3>").await.unwrap();
        assert_eq!(console.state.balance(EntityId(2)).await, 1000);
        assert_eq!(console.state.balance(EntityId(3)).await, 1000);
    }

    #[tokio::test]
    async fn resetme_asks_first() {
        let console = Console::new();
        let ada = console.as_entity(1, PermissionLevel::Player);
        console.say(&ada, "!daily").await.unwrap();

        let err = console.say(&ada, "!resetme").await.unwrap_err();
        assert!(matches!(err, DispatchError::ConfirmationRequired { .. }));
        assert_eq!(console.state.balance(EntityId(1)).await, 100);

        console.say(&ada, "!resetme cnf").await.unwrap();
        assert_eq!(console.state.balance(EntityId(1)).await, 0);
    }

    #[tokio::test]
    async fn createquest_fills_spawn_default() {
        let console = Console::new();
        let admin = console.as_entity(1, PermissionLevel::ScopeAdmin);
        console.say(&admin, "!createquest Mouse 1 2 3 40").await.unwrap();
        let quest = console.state.quest("mouse").await.unwrap();
        assert_eq!(quest.spawn_chance, 25.0);
        assert_eq!(quest.task, None);

        console
            .say(&admin, "!createquest \"Big Rat\" 5 5 5 100 \"Kill rats\" general https://img.example/mouse.png 10%")
            .await
            .unwrap();
        let quest = console.state.quest("big rat").await.unwrap();
        assert_eq!(quest.task.as_deref(), Some("Kill rats"));
        assert_eq!(quest.spawn_chance, 10.0);
    }

    #[tokio::test]
    async fn editquest_reports_each_property() {
        let console = Console::new();
        let admin = console.as_entity(1, PermissionLevel::ScopeAdmin);
        console.say(&admin, "!createquest Mouse 1 2 3 40").await.unwrap();

        let text = console
            .say(&admin, "!editquest mouse atk 9 hp 10 spawn 5% colour red")
            .await
            .unwrap()
            .text;
        assert!(text.contains("✓ attack → 9"));
        assert!(text.contains("✓ spawn → 5%"));
        assert!(text.contains("✗ hp → Must be at least 30!"));
        assert!(text.contains("✗ colour → Unknown property!"));

        let quest = console.state.quest("mouse").await.unwrap();
        assert_eq!(quest.attack, 9.0);
        assert_eq!(quest.hp, 40.0);
    }

    #[tokio::test]
    async fn guess_reads_follow_up_messages() {
        let console = Arc::new(Console::new());
        let ada = console.as_entity(1, PermissionLevel::Player);

        let game = {
            let console = console.clone();
            let ada = ada.clone();
            tokio::spawn(async move { console.say(&ada, "!guess").await })
        };

        for guess in 1..=10 {
            // Wait until the handler is parked before answering.
            while !matches!(
                console.dispatcher.handle_message(&ada, &guess.to_string()).await,
                MessageOutcome::Replied
            ) {
                if game.is_finished() {
                    break;
                }
                tokio::task::yield_now().await;
            }
            if game.is_finished() {
                break;
            }
        }
        let text = game.await.unwrap().unwrap().text;
        assert!(text.starts_with("Yes,") || text.starts_with("Out of guesses!"));
    }

    #[test]
    fn secret_numbers_cover_the_range() {
        let drawn: std::collections::HashSet<i64> = (0..2_000).map(|_| secret_number()).collect();
        assert!(drawn.iter().all(|n| GUESS_RANGE.contains(n)));
        assert_eq!(drawn.len(), 10);
    }
}
