//! Training-room encounter seeded with `MUD_DEMO`.

use anyhow::Result;
use mud_core::{CombatStats, Combatant, EntityId, RoomId, World};
use mud_runtime::EngineHandle;

pub struct Encounter {
    pub priest: EntityId,
    pub warrior: EntityId,
    pub dummy: EntityId,
}

pub fn seed(world: &mut World) -> Result<Encounter> {
    let hall = RoomId::new("training_hall");
    world.add_room(hall.clone(), true);
    world.add_room(RoomId::new("sanctuary"), false);

    let priest = world.spawn(Combatant::player("Ilsa", hall.clone(), 80).with_mana(300))?;
    let warrior = world.spawn(
        Combatant::player("Borin", hall.clone(), 150).with_stats(CombatStats {
            attack_power: Some(12),
            parry_pct: 10,
            riposte_pct: 50,
            ..CombatStats::default()
        }),
    )?;
    let dummy = world.spawn(
        Combatant::npc("training dummy", hall, 400).with_stats(CombatStats {
            attack_power: Some(6),
            dodge_pct: 5,
            ..CombatStats::default()
        }),
    )?;

    Ok(Encounter {
        priest,
        warrior,
        dummy,
    })
}

/// Opening moves: shield the warrior, curse the dummy, first swing.
pub async fn open(handle: &EngineHandle, encounter: &Encounter) -> Result<()> {
    handle
        .cast(encounter.priest, encounter.warrior, "pws")
        .await?;
    handle
        .cast(encounter.priest, encounter.dummy, "corruption")
        .await?;
    let swing = handle
        .resolve_attack(encounter.warrior, encounter.dummy)
        .await?;
    tracing::info!(target: "mud::demo", "{swing}");
    handle
        .cast(encounter.priest, encounter.warrior, "renew")
        .await?;
    Ok(())
}
