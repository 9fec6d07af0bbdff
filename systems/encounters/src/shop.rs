use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use tracing::debug;
use warband_catalog::Catalog;
use warband_core::{Command, Rarity, TemplateId, UnitId, UnitStats};
use warband_world::{query, GameState};

use crate::EncounterError;

/// A hero the merchant offers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopListing {
    /// Template of the recruit.
    pub template: TemplateId,
    /// Display name.
    pub name: String,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Stats of the level one recruit.
    pub stats: UnitStats,
    /// Gold price.
    pub cost: u32,
    /// Relative chance of being suggested.
    pub weight: u32,
}

/// Merchant stock for one floor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shop {
    listings: Vec<ShopListing>,
}

impl Shop {
    /// Stocks every hero with shop data that is unlocked on `floor`.
    #[must_use]
    pub fn for_floor(catalog: &Catalog, floor: u32) -> Self {
        let listings = catalog
            .shop_listings(floor)
            .filter_map(|template| {
                template.shop.map(|shop| ShopListing {
                    template: template.id.clone(),
                    name: template.name.clone(),
                    rarity: template.rarity,
                    stats: template.base_stats,
                    cost: shop.cost,
                    weight: shop.weight,
                })
            })
            .collect();
        Self { listings }
    }

    /// Offered heroes in catalog order.
    #[must_use]
    pub fn listings(&self) -> &[ShopListing] {
        &self.listings
    }

    /// Listing for `template`, if stocked.
    #[must_use]
    pub fn listing(&self, template: &TemplateId) -> Option<&ShopListing> {
        self.listings
            .iter()
            .find(|listing| &listing.template == template)
    }

    /// Listings the party can buy right now.
    pub fn affordable<'a>(
        &'a self,
        state: &'a GameState,
    ) -> impl Iterator<Item = &'a ShopListing> + 'a {
        let has_room = query::roster_has_room(state);
        self.listings
            .iter()
            .filter(move |listing| has_room && listing.cost <= state.gold())
    }

    /// Picks a listing at random, weighted by listing weight.
    pub fn suggest<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ShopListing> {
        let index = WeightedIndex::new(self.listings.iter().map(|listing| listing.weight)).ok()?;
        self.listings.get(index.sample(rng))
    }

    /// Emits the purchase of `template` once the roster and purse allow it.
    pub fn purchase(
        &self,
        state: &GameState,
        template: &TemplateId,
        out: &mut Vec<Command>,
    ) -> Result<(), EncounterError> {
        let listing = self
            .listing(template)
            .ok_or_else(|| EncounterError::NotForSale(template.clone()))?;
        if !query::roster_has_room(state) {
            return Err(EncounterError::RosterFull {
                capacity: state.max_team_size(),
            });
        }
        if listing.cost > state.gold() {
            return Err(EncounterError::InsufficientGold {
                required: listing.cost,
                available: state.gold(),
            });
        }

        debug!(template = %listing.template, cost = listing.cost, "purchase");
        out.push(Command::PurchaseUnit {
            template: listing.template.clone(),
            cost: listing.cost,
        });
        Ok(())
    }

    /// Emits the dismissal of `unit` from the roster.
    pub fn dismiss(
        &self,
        state: &GameState,
        unit: UnitId,
        out: &mut Vec<Command>,
    ) -> Result<(), EncounterError> {
        if !state.player_team().iter().any(|member| member.id == unit) {
            return Err(EncounterError::UnknownUnit(unit));
        }
        out.push(Command::DismissUnit { unit });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn later_floors_unlock_more_stock() {
        let catalog = Catalog::standard();
        let first = Shop::for_floor(&catalog, 1);
        let names: Vec<&str> = first
            .listings()
            .iter()
            .map(|listing| listing.name.as_str())
            .collect();
        assert_eq!(names, vec!["Knight", "Archer"]);
        assert_eq!(first.listings()[1].cost, 120);

        let second = Shop::for_floor(&catalog, 2);
        assert_eq!(second.listings().len(), 4);
        assert!(second.listing(&TemplateId::from("berserker")).is_some());
        assert!(first.listing(&TemplateId::from("berserker")).is_none());
    }

    #[test]
    fn suggestions_come_from_the_stock() {
        let shop = Shop::for_floor(&Catalog::standard(), 3);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..32 {
            let suggestion = shop.suggest(&mut rng).expect("stock is not empty");
            assert!(shop.listing(&suggestion.template).is_some());
        }
    }

    #[test]
    fn empty_stock_suggests_nothing() {
        let shop = Shop {
            listings: Vec::new(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(shop.suggest(&mut rng).is_none());
    }
}
