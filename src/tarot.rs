use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;

/// The Major Arcana, in deck order.
pub const MAJOR_ARCANA: [&str; 22] = [
    "The Fool",
    "The Magician",
    "The High Priestess",
    "The Empress",
    "The Emperor",
    "The Hierophant",
    "The Lovers",
    "The Chariot",
    "Strength",
    "The Hermit",
    "Wheel of Fortune",
    "Justice",
    "The Hanged Man",
    "Death",
    "Temperance",
    "The Devil",
    "The Tower",
    "The Star",
    "The Moon",
    "The Sun",
    "Judgement",
    "The World",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawnCard {
    pub name: &'static str,
    pub reversed: bool,
}

impl fmt::Display for DrawnCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reversed {
            write!(f, "{} (reversed)", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

/// Draw `count` distinct cards, each reversed with even odds.
/// `count` is capped at the size of the deck.
pub fn draw<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<DrawnCard> {
    MAJOR_ARCANA
        .choose_multiple(&mut *rng, count)
        .map(|name| DrawnCard {
            name: *name,
            reversed: rng.random_bool(0.5),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn draws_distinct_cards() {
        let mut rng = StdRng::seed_from_u64(7);
        let cards = draw(&mut rng, 5);

        assert_eq!(cards.len(), 5);
        let names: HashSet<_> = cards.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn count_is_capped_at_deck_size() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(draw(&mut rng, 100).len(), MAJOR_ARCANA.len());
        assert!(draw(&mut rng, 0).is_empty());
    }

    #[test]
    fn both_orientations_show_up() {
        let mut rng = StdRng::seed_from_u64(42);
        let cards: Vec<_> = (0..20).flat_map(|_| draw(&mut rng, 10)).collect();

        assert!(cards.iter().any(|c| c.reversed));
        assert!(cards.iter().any(|c| !c.reversed));
    }

    #[test]
    fn reversed_card_display() {
        let card = DrawnCard {
            name: "The Tower",
            reversed: true,
        };
        assert_eq!(card.to_string(), "The Tower (reversed)");
        assert_eq!(
            DrawnCard {
                reversed: false,
                ..card
            }
            .to_string(),
            "The Tower"
        );
    }
}
