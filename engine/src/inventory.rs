//! Carried items.
//!
//! Inventories are keyed by owner id and live on the game rather than in a
//! zone so they follow their owner through zone changes and body swaps.

use crate::{prelude::*, ActionKind, EntityKind, Game, ItemKind};

impl Game {
    /// Items carried by `owner`.
    pub fn inventory(&self, owner: EntityId) -> &[Entity] {
        self.inventories.get(&owner).map_or(&[], |v| v.as_slice())
    }

    /// Items carried by the current host.
    pub fn player_inventory(&self) -> &[Entity] {
        self.inventory(self.player)
    }

    fn inventory_mut(&mut self, owner: EntityId) -> &mut Vec<Entity> {
        self.inventories.entry(owner).or_default()
    }

    /// Add an ability to the host's kit. Returns whether it was new.
    pub fn grant_ability(&mut self, kind: ActionKind) -> bool {
        let Some(a) = self.player_mut().and_then(|e| e.actor_mut()) else {
            return false;
        };
        if a.actions.contains(&kind) {
            return false;
        }
        a.actions.push(kind);
        true
    }

    /// Pick up the item under the host's feet.
    pub fn pick_up(&mut self) {
        let Some(pos) = self.player_pos() else {
            return;
        };
        let Some(e) = self.level.entity_at(pos).filter(|e| e.id != self.player) else {
            msg!(self, "There is nothing here to pick up.");
            return;
        };
        if e.item().is_none() {
            msg!(self, "You can't pick that up.");
            return;
        }
        let id = e.id;
        let Some(item) = self.level.remove(id) else {
            return;
        };
        msg!(self, "You pick up {}.", item.a_name());
        let grants = item.item().and_then(|i| i.grants_ability);

        let coins = item
            .item()
            .filter(|i| i.kind == ItemKind::Currency)
            .map(|i| i.amount);

        let player = self.player;
        let inv = self.inventory_mut(player);
        let purse = coins.and_then(|_| {
            inv.iter()
                .position(|e| e.item().is_some_and(|i| i.kind == ItemKind::Currency))
        });
        match (purse, coins) {
            (Some(slot), Some(amount)) => {
                if let EntityKind::Item(i) = &mut inv[slot].kind {
                    i.amount += amount;
                }
            }
            _ => inv.push(item),
        }

        if let Some(kind) = grants {
            if self.grant_ability(kind) {
                msg!(self, "You learned how to {}.", kind.to_string().replace('_', " "));
            }
        }
    }

    /// Drop an item from the host's inventory at its feet.
    pub fn drop_item(&mut self, index: usize) {
        let Some(pos) = self.player_pos() else {
            return;
        };
        let player = self.player;
        let inv = self.inventory_mut(player);
        if index >= inv.len() {
            return;
        }
        let mut item = inv.remove(index);
        item.pos = pos;
        let name = item.a_name();
        self.level.insert(item);
        msg!(self, "You drop {name}.");
    }

    /// Eat from an inventory. Only berries are edible, they feed the host.
    pub fn eat(&mut self, owner: EntityId, index: usize) {
        let own = owner == self.player;
        let inv = self.inventory(owner);
        if inv.is_empty() {
            if own {
                msg!(self, "You have nothing to eat.");
            }
            return;
        }
        let Some(e) = inv.get(index) else {
            return;
        };
        if !e.item().is_some_and(|i| i.kind == ItemKind::Berry) {
            let name = e.name.to_lowercase();
            if own {
                msg!(self, "You can't eat the {name}.");
            } else {
                msg!(self, "You decide not to eat the {name}.");
            }
            return;
        }
        self.inventory_mut(owner).remove(index);

        let healed = self.player_stats_mut().map_or(0, |s| s.heal(1));
        if healed > 0 {
            msg!(self, "That was tart!");
        } else {
            msg!(self, "That was really tart!");
        }
    }

    /// Take an item out of a container into the host's inventory.
    pub fn take_from(&mut self, container: EntityId, index: usize) {
        let src = self.inventory_mut(container);
        if index >= src.len() {
            return;
        }
        let item = src.remove(index);
        let name = item.a_name();
        let player = self.player;
        self.inventory_mut(player).push(item);
        msg!(self, "You take {name}.");
    }

    /// Move an item between two inventories.
    pub fn move_item(&mut self, from: EntityId, index: usize, to: EntityId) {
        if from == to {
            return;
        }
        let src = self.inventory_mut(from);
        if index >= src.len() {
            return;
        }
        let item = src.remove(index);
        let name = item.a_name();
        self.inventory_mut(to).push(item);

        let label = if to == self.player {
            "your inventory".to_string()
        } else {
            self.level
                .entity(to)
                .or_else(|| {
                    self.inventories
                        .values()
                        .flatten()
                        .find(|e| e.id == to)
                })
                .map_or_else(|| format!("#{to}"), |e| format!("the {}", e.name.to_lowercase()))
        };
        msg!(self, "You put {name} into {label}.");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::test::*;

    fn drop_here(g: &mut Game, template: &str) -> EntityId {
        let pos = g.player_pos().unwrap();
        let e = g.make_item(template, pos).unwrap();
        g.level.insert(e)
    }

    #[test]
    fn pick_up_and_learn() {
        let mut g = game(60);
        clear_zone(&mut g);
        g.pick_up();
        assert_eq!(g.log.last(), Some("There is nothing here to pick up."));

        drop_here(&mut g, "destabilizer");
        g.pick_up();
        assert!(g.log.mentions("You pick up a destabilizer."));
        assert_eq!(g.log.last(), Some("You learned how to destabilize."));
        assert_eq!(g.player_inventory().len(), 1);
        assert!(g
            .player()
            .and_then(|e| e.actor())
            .unwrap()
            .actions
            .contains(&ActionKind::Destabilize));
    }

    #[test]
    fn features_stay_put() {
        let mut g = game(61);
        clear_zone(&mut g);
        let pos = g.player_pos().unwrap();
        let door = g.make_door(pos);
        g.level.insert(door);
        g.pick_up();
        assert_eq!(g.log.last(), Some("You can't pick that up."));
    }

    #[test]
    fn coins_stack() {
        let mut g = game(62);
        clear_zone(&mut g);
        for _ in 0..2 {
            drop_here(&mut g, "coins");
            g.pick_up();
        }
        let inv = g.player_inventory();
        assert_eq!(inv.len(), 1);
        assert_eq!(inv[0].item().unwrap().amount, 2);
    }

    #[test]
    fn berries_are_tart() {
        let mut g = game(63);
        clear_zone(&mut g);
        let me = g.player_id();
        g.eat(me, 0);
        assert_eq!(g.log.last(), Some("You have nothing to eat."));

        drop_here(&mut g, "strawberry");
        drop_here(&mut g, "raspberry");
        g.pick_up();
        g.pick_up();
        g.eat(me, 0);
        assert_eq!(g.log.last(), Some("That was really tart!"));

        g.player_stats_mut().unwrap().hp -= 5;
        g.eat(me, 0);
        assert_eq!(g.log.last(), Some("That was tart!"));
        assert!(g.player_inventory().is_empty());
    }

    #[test]
    fn containers_hold_items() {
        let mut g = game(64);
        clear_zone(&mut g);
        drop_here(&mut g, "blueberry");
        g.pick_up();
        let bag = drop_here(&mut g, "inventory");
        let me = g.player_id();

        g.move_item(me, 0, bag);
        assert!(g.player_inventory().is_empty());
        assert_eq!(g.inventory(bag).len(), 1);
        assert!(g.log.last().unwrap().starts_with("You put a blueberry into the "));

        g.take_from(bag, 0);
        assert_eq!(g.log.last(), Some("You take a blueberry."));
        assert_eq!(g.player_inventory().len(), 1);

        g.drop_item(0);
        assert!(g.player_inventory().is_empty());
        assert_eq!(g.log.last(), Some("You drop a blueberry."));
        let pos = g.player_pos().unwrap();
        assert_eq!(g.level.items_at(pos).len(), 2);
    }
}
