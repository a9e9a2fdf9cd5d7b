use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::model::turn::{Choice, TurnPayload};

struct Template {
    story: &'static str,
    choices: [&'static str; 4],
}

const POOL: &[Template] = &[
    Template {
        story: "You step onto a narrow path that winds between moss-covered stones. \
A cold wind carries the smell of rain and something older, like smoke from a fire \
long since buried. Somewhere ahead, a bell rings once and falls silent. The path \
splits in two, and both directions look equally uncertain.",
        choices: ["Follow the bell", "Take the left path", "Examine the stones", "Wait for the rain"],
    },
    Template {
        story: "The door groans as you push it open, revealing a room lit by a single \
candle. Shelves of dusty jars line the walls, each labeled in a hand you cannot read. \
On the table lies a folded note with your name written on it. Footsteps echo somewhere \
beneath the floorboards.",
        choices: ["Read the note", "Inspect the jars", "Listen at the floor", "Blow out the candle"],
    },
    Template {
        story: "You reach the edge of a quiet market square just as the stalls begin to \
close. A merchant with silver rings beckons you closer, holding up a small wooden box. \
Across the square, a hooded figure watches you without blinking. The last light of \
the day slips behind the rooftops.",
        choices: ["Approach the merchant", "Confront the figure", "Slip into an alley", "Buy the wooden box"],
    },
    Template {
        story: "Water drips steadily from the ceiling of the cave as you move deeper \
inside. Your footsteps stir up faint blue sparks in the puddles, lighting strange \
carvings on the walls. A low hum grows louder the further you go. Behind you, the \
entrance has quietly disappeared.",
        choices: ["Study the carvings", "Follow the humming", "Search for the exit", "Touch the sparks"],
    },
    Template {
        story: "A rider bursts out of the treeline and reins in beside you, breathless \
and wide-eyed. They press a sealed letter into your hands and beg you to deliver it \
before nightfall. Before you can answer, horns sound in the distance. The rider spurs \
the horse and vanishes the way they came.",
        choices: ["Open the letter", "Head for the horns", "Chase the rider", "Hide in the trees"],
    },
    Template {
        story: "You wake on the deck of a drifting boat with no memory of boarding it. \
Fog hides the shoreline, and the oars are gone. A lantern swings from the mast, its \
flame burning green. From somewhere below deck comes the sound of slow, patient \
knocking.",
        choices: ["Go below deck", "Call into the fog", "Take the lantern", "Check the cargo"],
    },
];

/// Pre-authored turns used whenever the backend cannot supply one.
/// Every template already satisfies the payload invariants.
pub struct FallbackProvider {
    rng: Box<dyn RngCore + Send>,
}

impl FallbackProvider {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic selection, for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    pub fn next(&mut self) -> TurnPayload {
        let index = self.rng.gen_range(0..POOL.len());
        build(&POOL[index])
    }

    pub fn pool() -> Vec<TurnPayload> {
        POOL.iter().map(build).collect()
    }
}

impl Default for FallbackProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn build(template: &Template) -> TurnPayload {
    TurnPayload {
        story: template.story.to_string(),
        choices: template
            .choices
            .iter()
            .enumerate()
            .map(|(i, text)| Choice::new((i + 1).to_string(), *text))
            .collect(),
    }
}
