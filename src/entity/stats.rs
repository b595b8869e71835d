//! Stats, damage, and the stat sheet component

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::bus::events::{EntityActed, EntityAttacked, EntityMended, RoundPassed, StatQuery};
use crate::bus::EventBus;
use crate::core::types::EntityId;
use crate::entity::SharedPosition;
use crate::undo::Invertible;

/// A clamped integer stat. Access is always through `total()`; stats never
/// convert implicitly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stat {
    base: i32,
    min: i32,
    max: i32,
}

impl Stat {
    pub fn new(base: i32, min: i32, max: i32) -> Self {
        Self { base, min, max }
    }

    pub fn total(&self) -> i32 {
        self.base.clamp(self.min, self.max)
    }
}

/// A stat with a depletable current value (HP, AP).
///
/// `shift` does not clamp, so every shift is exactly invertible; bounding
/// happens where the shift amount is decided.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Exhaustible {
    cap: Stat,
    current: i32,
}

impl Exhaustible {
    pub fn full(cap: i32) -> Self {
        Self { cap: Stat::new(cap, 0, cap), current: cap }
    }

    pub fn total(&self) -> i32 {
        self.cap.total()
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn shift(&mut self, delta: i32) {
        self.current += delta;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    /// Never reduced by protections.
    Untyped,
    Bludgeoning,
    Piercing,
    Slashing,
    Fire,
    Cold,
    Lightning,
    Necrotic,
    Radiant,
    Poison,
    Psychic,
}

/// Typed damage packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Damage {
    pub amount: i32,
    pub kind: DamageKind,
}

impl Damage {
    pub fn new(amount: i32, kind: DamageKind) -> Self {
        Self { amount, kind }
    }
}

/// Flat armor plus resistance steps in [-2, 4]. Each resistance step shaves
/// half the incoming amount, rounded in the victim's favor; negative steps
/// are vulnerability.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DamageProtection {
    armor: i32,
    resistance: i32,
}

impl DamageProtection {
    pub fn new(armor: i32, resistance: i32) -> Self {
        Self { armor: armor.max(0), resistance: resistance.clamp(-2, 4) }
    }

    pub fn reduce(&self, amount: i32) -> i32 {
        let resisted = amount - ((amount * self.resistance) as f32 / 2.0).ceil() as i32;
        (resisted - self.armor).max(0)
    }
}

/// Which stat a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Hp,
    Ap,
    Strength,
    Dexterity,
    Intelligence,
    Wisdom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionSpec {
    pub kind: DamageKind,
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub resistance: i32,
}

/// Configured base values for an entity's stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: i32,
    pub ap: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    #[serde(default)]
    pub protections: Vec<ProtectionSpec>,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            hp: 16,
            ap: 4,
            strength: 5,
            dexterity: 5,
            intelligence: 5,
            wisdom: 5,
            protections: Vec::new(),
        }
    }
}

/// Component owning one entity's stats. HP and AP mutate only through
/// invertible exhaust commands; ability scores are fixed.
pub struct StatSheet {
    entity: EntityId,
    position: SharedPosition,
    hp: Rc<RefCell<Exhaustible>>,
    ap: Rc<RefCell<Exhaustible>>,
    strength: Stat,
    dexterity: Stat,
    intelligence: Stat,
    wisdom: Stat,
    protections: AHashMap<DamageKind, DamageProtection>,
}

impl StatSheet {
    pub fn attach(bus: &Rc<EventBus>, entity: EntityId, position: SharedPosition, block: &StatBlock) {
        let protections = block
            .protections
            .iter()
            .map(|spec| (spec.kind, DamageProtection::new(spec.armor, spec.resistance)))
            .collect();
        let sheet = Rc::new(Self {
            entity,
            position,
            hp: Rc::new(RefCell::new(Exhaustible::full(block.hp))),
            ap: Rc::new(RefCell::new(Exhaustible::full(block.ap))),
            strength: Stat::new(block.strength, 0, 20),
            dexterity: Stat::new(block.dexterity, 0, 20),
            intelligence: Stat::new(block.intelligence, 0, 20),
            wisdom: Stat::new(block.wisdom, 0, 20),
            protections,
        });

        let s = Rc::clone(&sheet);
        bus.respond::<EntityActed, _>(move |event, commands| {
            if event.entity != s.entity {
                return;
            }
            commands.record(ExhaustCommand { stat: Rc::clone(&s.ap), amount: event.ap_cost });
        });

        // runs after every protection modifier has settled the occurrence
        let s = Rc::clone(&sheet);
        bus.subscribe_at::<EntityAttacked, _>(f32::INFINITY, move |event, commands| {
            if !event.target_cells.contains(&s.position.get()) {
                return;
            }
            let mut amount = event.damage.amount;
            if event.damage.kind != DamageKind::Untyped {
                if let Some(protection) = s.protections.get(&event.damage.kind) {
                    amount = protection.reduce(amount);
                }
            }
            // expected damage is recorded before HP bounding; overkill counts
            event.damage_dealt.insert(s.entity, amount);
            let hp = s.hp.borrow();
            let amount = amount.clamp(hp.current() - hp.total(), hp.current());
            drop(hp);
            if amount == 0 || event.probe {
                return;
            }
            commands.record(ExhaustCommand { stat: Rc::clone(&s.hp), amount });
        });

        let s = Rc::clone(&sheet);
        bus.subscribe_at::<EntityMended, _>(f32::INFINITY, move |event, commands| {
            if !event.target_cells.contains(&s.position.get()) {
                return;
            }
            let hp = s.hp.borrow();
            let headroom = hp.total() - hp.current();
            drop(hp);
            let healed = event.amount.clamp(0, headroom);
            event.mending_done.insert(s.entity, healed);
            if healed == 0 || event.probe {
                return;
            }
            commands.record(ExhaustCommand { stat: Rc::clone(&s.hp), amount: -healed });
        });

        let s = Rc::clone(&sheet);
        bus.respond::<StatQuery, _>(move |query, _| {
            if !query.values.contains_key(&s.entity) {
                return;
            }
            let value = match query.kind {
                StatKind::Hp => s.hp.borrow().current(),
                StatKind::Ap => s.ap.borrow().current(),
                StatKind::Strength => s.strength.total(),
                StatKind::Dexterity => s.dexterity.total(),
                StatKind::Intelligence => s.intelligence.total(),
                StatKind::Wisdom => s.wisdom.total(),
            };
            query.values.insert(s.entity, value);
        });

        // AP regenerates to full at the round boundary, invertibly
        let s = sheet;
        bus.respond::<RoundPassed, _>(move |_, commands| {
            let ap = s.ap.borrow();
            // a final act may overspend below zero; the boundary restores to
            // full either way
            let regen = ap.total() - ap.current();
            drop(ap);
            if regen <= 0 {
                return;
            }
            commands.record(ExhaustCommand { stat: Rc::clone(&s.ap), amount: -regen });
        });
    }
}

/// Invertible drain of an exhaustible stat; negative amounts restore.
struct ExhaustCommand {
    stat: Rc<RefCell<Exhaustible>>,
    amount: i32,
}

impl Invertible for ExhaustCommand {
    fn apply(&mut self) {
        self.stat.borrow_mut().shift(-self.amount);
    }

    fn undo(&mut self) {
        self.stat.borrow_mut().shift(self.amount);
    }
}
