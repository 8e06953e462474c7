use std::collections::BTreeSet;

use crate::notes::NoteId;

pub const STEPS: usize = 16;

pub type Slot = Option<NoteId>;

/// One bar of sixteenth-note slots. Slots never change after construction;
/// selecting a different pattern swaps the whole value.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub id:          &'static str,
    pub name:        &'static str,
    pub category:    &'static str,
    pub description: &'static str,
    slots:           [Slot; STEPS],
}

impl Pattern {
    pub fn new(id: &'static str, name: &'static str, slots: [Slot; STEPS]) -> Self {
        Self { id, name, category: "Uncategorized", description: "", slots }
    }

    /// Builds the slots from a per-step closure.
    pub fn generate(id: &'static str, name: &'static str,
                    f: impl Fn(usize) -> Option<&'static str>) -> Self {
        Self::new(id, name, std::array::from_fn(|i| f(i).map(NoteId::from_static)))
    }

    /// Builds the slots from `(step, note)` pairs; every other step is a rest.
    pub fn from_hits(id: &'static str, name: &'static str,
                     hits: &[(usize, &'static str)]) -> Self {
        let mut slots: [Slot; STEPS] = Default::default();
        for &(step, note) in hits {
            if step < STEPS { slots[step] = Some(NoteId::from_static(note)); }
        }
        Self::new(id, name, slots)
    }

    pub fn described(mut self, category: &'static str, description: &'static str) -> Self {
        self.category    = category;
        self.description = description;
        self
    }

    pub fn slots(&self) -> &[Slot; STEPS] { &self.slots }

    pub fn slot(&self, step: usize) -> Option<&NoteId> {
        self.slots.get(step).and_then(|s| s.as_ref())
    }

    /// `x-C3-x-C3-...`: rests as `x`, notes upper-cased.
    pub fn pattern_string(&self) -> String {
        self.slots.iter()
            .map(|s| s.as_ref().map_or_else(|| "x".to_string(), |n| n.as_str().to_uppercase()))
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn uses_note(&self, name: &str) -> bool {
        self.slots.iter().flatten().any(|n| n.as_str() == name)
    }

    pub fn is_active(&self, name: &str, step: usize) -> bool {
        self.slot(step).is_some_and(|n| n.as_str() == name)
    }

    /// Distinct octaves used by the pattern, ascending.
    pub fn active_octaves(&self) -> Vec<u8> {
        self.slots.iter().flatten()
            .filter_map(NoteId::octave)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id:       &'static str,
    pub name:     &'static str,
    pub category: &'static str,
}

/// Read-only pattern library, in display order.
pub struct Catalog {
    patterns: Vec<Pattern>,
}

impl Catalog {
    pub fn new(patterns: Vec<Pattern>) -> Self { Self { patterns } }

    pub fn builtin() -> Self { Self::new(builtin_patterns()) }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.patterns.iter().position(|p| p.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Pattern> { self.patterns.get(index) }

    pub fn len(&self) -> usize { self.patterns.len() }

    pub fn is_empty(&self) -> bool { self.patterns.is_empty() }

    /// Selector entries in catalog order.
    pub fn all(&self) -> impl Iterator<Item = CatalogEntry> + '_ {
        self.patterns.iter().map(|p| CatalogEntry { id: p.id, name: p.name, category: p.category })
    }
}

fn builtin_patterns() -> Vec<Pattern> {
    vec![
        // Basic
        Pattern::generate("basic4", "Four-to-the-Floor", |i| (i % 4 == 0).then_some("C3"))
            .described("Basic", "Classic four beat pattern, fundamental to electronic dance music"),
        Pattern::generate("gateEighths", "8th Note Gate", |i| (i % 2 == 0).then_some("C3"))
            .described("Basic", "Rhythmic eighth note pattern commonly used in dance music basics"),
        Pattern::generate("offBeat", "Off-Beat Groove", |i| (i % 2 == 1).then_some("C3"))
            .described("Basic", "Emphasizes the off-beats, creating a bouncy, syncopated feel"),
        Pattern::generate("rolling", "16th Note Roll", |_| Some("C3"))
            .described("Basic", "Continuous 16th notes, creates intense, driving energy"),
        Pattern::generate("walkingBass", "Walking Bass", |i| Some(["C3", "E3", "G3", "A3"][i % 4]))
            .described("Common", "Classic ascending pattern using scale degrees 1-3-5-6"),
        Pattern::generate("octaveJump", "Octave Jump", |i| Some(if i % 2 == 0 { "C3" } else { "C4" }))
            .described("Common", "Alternates between two octaves for a dynamic, jumping feel"),
        Pattern::from_hits("syncopated", "Syncopated Groove",
            &[(0, "C3"), (3, "C3"), (6, "C3"), (10, "C3"), (13, "C3")])
            .described("Common", "Emphasizes off-beats and weak beats for groove"),
        Pattern::generate("octaveGroove", "Oct Groove", |i| match i % 8 {
            0 | 6 => Some("C3"), 2 => Some("C4"), 4 => Some("G3"), _ => None,
        }),

        // Trance
        Pattern::generate("tranceRoller", "Trance Roll", |i| (i % 4 > 0).then_some("C3"))
            .described("Trance", "Classic rolling trance bassline with three-note groups (xxx-xxx-xxx-xxx)"),
        Pattern::generate("tranceRollerOct", "Trance Roll Oct", |i| match i % 4 {
            1 | 3 => Some("C4"), 2 => Some("C3"), _ => None,
        })
            .described("Trance", "Rolling trance bassline with alternating octaves (high-low-high rest)"),
        Pattern::generate("tranceRollerOctAlt", "Trance Roll Oct Alternating", |i| {
            let group = i % 4;
            if group == 0 { return None; }
            let n = (i / 4) * 3 + (group - 1);
            Some(if n % 2 == 0 { "C3" } else { "C4" })
        })
            .described("Trance", "Rolling trance bassline with continuous octave alternation"),
        Pattern::generate("ayla", "Ayla", |i| match i {
            0 | 8 => Some("C3"), 4 | 12 => Some("G2"), 2 | 10 => Some("E2"), 6 | 14 => Some("F2"),
            _ => None,
        }),
        Pattern::generate("rank1", "Rank 1 Style", |i| match i % 4 {
            0 => Some("C3"), 1 => Some("G3"), _ => None,
        })
            .described("Trance", "Inspired by classic Dutch trance, alternating root and fifth"),
        Pattern::from_hits("veracocha", "Veracocha Pattern",
            &[(0, "C3"), (3, "E3"), (6, "G3"), (9, "E3"), (12, "F3"), (15, "G3")])
            .described("Trance", "Melodic sequence inspired by 'Carte Blanche', using chord tones"),
        Pattern::generate("systemF", "System F Pulse", |i| (i % 4 != 2).then_some("C3"))
            .described("Trance", "Driving pulse pattern with quick double hits, signature Ferry Corsten style"),
        Pattern::from_hits("airwave", "Airwave Pattern",
            &[(0, "C3"), (3, "G3"), (6, "A#3"), (9, "G3"), (12, "F3"), (15, "G3")])
            .described("Trance", "Melodic sequence inspired by Rank 1's 'Airwave', using dominant seventh"),
        Pattern::generate("gouryella", "Gouryella Hook", |i| match i % 8 {
            0 | 2 => Some("C3"), 4 => Some("G3"), 6 => Some("E3"), _ => None,
        })
            .described("Trance", "Iconic pattern from Ferry Corsten & Tiësto collaboration"),
        Pattern::from_hits("dutchTrance", "Dutch Trance Gate",
            &[(0, "C3"), (6, "C3"), (2, "G3"), (8, "G3"), (4, "F3"), (10, "A3")])
            .described("Trance", "Gated pattern with chord progression, typical of Dutch trance style"),

        // House & Techno
        Pattern::from_hits("houseGroove", "Classic House",
            &[(0, "C3"), (3, "C3"), (6, "C3"), (9, "C3"), (12, "C3")])
            .described("House", "Traditional house music bassline with emphasis on upbeats"),
        Pattern::from_hits("techWalk", "Techno Walk",
            &[(0, "C3"), (4, "D#3"), (8, "D3"), (12, "C3")])
            .described("Techno", "Walking techno bassline with chromatic movement"),
        Pattern::from_hits("acidLine", "303 Acid Line",
            &[(0, "C3"), (2, "C3"), (3, "C#3"), (6, "D3"), (8, "D#3"), (10, "D3"), (12, "C#3"), (14, "C3")])
            .described("Acid", "Classic acid house pattern inspired by the Roland TB-303"),
        Pattern::generate("pushingGate", "Push Gate", |i| (i % 2 == 0).then_some("C3"))
            .described("Techno", "Gated pattern with pushed timing, common in modern techno"),

        // UK
        Pattern::from_hits("garage2Step", "2-Step Garage",
            &[(0, "C3"), (8, "C3"), (3, "C3"), (11, "C3"), (6, "C3"), (14, "C3")])
            .described("UK Garage", "Classic two-step garage rhythm with swung feeling"),
        Pattern::from_hits("ukBass", "UK Bass Pattern",
            &[(0, "C2"), (4, "G2"), (7, "F2"), (8, "C2"), (12, "G2"), (15, "F2")])
            .described("UK Bass", "Heavy sub bass movement typical of UK bass music"),
        Pattern::from_hits("silkArp", "Silk Arp",
            &[(0, "C3"), (2, "E3"), (4, "G3"), (6, "C4"), (8, "G3"), (10, "E3"), (12, "C3"), (14, "E3")])
            .described("UK Garage", "Arpeggiated garage pattern with melodic movement"),

        // Drum & Bass
        Pattern::from_hits("dnbRoller", "DnB Roller",
            &[(0, "C3"), (4, "C3"), (7, "G3"), (8, "F3"), (10, "E3"), (12, "D3"), (14, "C3")])
            .described("Drum & Bass", "Rolling bassline with descending melodic movement"),
        Pattern::generate("jumpUp", "Jump Up Bass", |i| match i % 8 {
            0 => Some("C3"), 2 => Some("G2"), 4 => Some("E2"), 6 => Some("C2"), _ => None,
        })
            .described("Drum & Bass", "Aggressive jump-up DnB style with octave drops"),

        // Hip Hop & Trap
        Pattern::from_hits("trapBoom", "Trap 808",
            &[(0, "C2"), (7, "C2"), (3, "C2"), (11, "C2"), (14, "C2")])
            .described("Trap", "Modern trap pattern with booming 808 placement"),
        Pattern::from_hits("boombap", "Boom Bap",
            &[(0, "C3"), (8, "C3"), (3, "G3"), (11, "G3"), (6, "E3"), (14, "E3")])
            .described("Hip Hop", "Classic hip-hop style with melodic movement"),

        // Iconic tracks
        Pattern::from_hits("chicane", "Saltwater",
            &[(0, "C3"), (2, "G2"), (4, "A#2"), (6, "F3"), (8, "G3"), (10, "F3"), (12, "D#3"), (14, "C3")])
            .described("Progressive", "Inspired by Chicane's 'Saltwater', melodic progressive pattern"),
        Pattern::generate("twoTribes", "Two Tribes", |i| match i % 8 {
            0 | 2 => Some("C3"), 4 => Some("A#2"), 6 => Some("G2"), _ => None,
        })
            .described("Classic Dance", "Inspired by FGTH's 'Two Tribes', iconic dance pattern"),
        Pattern::generate("outOfTheBlue", "Out of the Blue", |i| match i % 8 {
            0 => Some("C3"), 2 => Some("E3"), 4 => Some("F3"), 6 => Some("G3"), _ => None,
        })
            .described("Progressive Trance", "System F/Ferry Corsten's iconic rising progression"),
        Pattern::from_hits("spacemanid", "ID&T Pattern",
            &[(0, "C3"), (4, "C3"), (8, "A#2"), (12, "G2")])
            .described("Hard Trance", "Hard trance pattern inspired by Spaceman's 'Magic Fly'"),
    ]
}
