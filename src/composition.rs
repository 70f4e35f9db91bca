use serde::{Deserialize, Serialize};

pub const MAX_LEVEL: i32 = 3;

const GRASS_INCOME_BY_LEVEL: [f64; 4] = [0.0, 1.0, 2.0, 3.0];
const BUSH_INCOME_BY_LEVEL: [f64; 4] = [0.0, 3.0, 5.0, 8.0];
const TREE_INCOME_BY_LEVEL: [f64; 4] = [0.0, 8.0, 12.0, 18.0];

pub const DEFAULT_LOW_DENSITY: f64 = 5.0;
pub const DEFAULT_HIGH_DENSITY: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Grass,
    Bush,
    Tree,
}

impl Element {
    pub const ALL: [Element; 3] = [Element::Grass, Element::Bush, Element::Tree];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    Low,
    Medium,
    High,
}

/// Plant levels on one tile. A level of 0 means the plant is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileComposition {
    pub grass_level: i32,
    pub bush_level: i32,
    pub tree_level: i32,
}

impl TileComposition {
    pub fn new(grass_level: i32, bush_level: i32, tree_level: i32) -> Self {
        let mut composition = Self {
            grass_level,
            bush_level,
            tree_level,
        };
        composition.validate();
        composition
    }

    /// Clamps every level into `0..=MAX_LEVEL`.
    pub fn validate(&mut self) {
        self.grass_level = self.grass_level.clamp(0, MAX_LEVEL);
        self.bush_level = self.bush_level.clamp(0, MAX_LEVEL);
        self.tree_level = self.tree_level.clamp(0, MAX_LEVEL);
    }

    pub fn level(&self, element: Element) -> i32 {
        match element {
            Element::Grass => self.grass_level,
            Element::Bush => self.bush_level,
            Element::Tree => self.tree_level,
        }
    }

    /// Raises `element` by one level and returns the clamped result.
    pub fn raise(&mut self, element: Element) -> i32 {
        match element {
            Element::Grass => self.grass_level += 1,
            Element::Bush => self.bush_level += 1,
            Element::Tree => self.tree_level += 1,
        }
        self.validate();
        self.level(element)
    }

    pub fn contribution(&self, element: Element) -> f64 {
        let table = match element {
            Element::Grass => &GRASS_INCOME_BY_LEVEL,
            Element::Bush => &BUSH_INCOME_BY_LEVEL,
            Element::Tree => &TREE_INCOME_BY_LEVEL,
        };
        table[self.level(element).clamp(0, MAX_LEVEL) as usize]
    }

    pub fn income(&self) -> f64 {
        Element::ALL.iter().map(|e| self.contribution(*e)).sum()
    }

    pub fn density(&self, low: f64, high: f64) -> Density {
        let production = self.income();
        if production < low {
            Density::Low
        } else if production < high {
            Density::Medium
        } else {
            Density::High
        }
    }

    /// Element with the largest contribution; grass wins ties.
    pub fn dominant_element(&self) -> Element {
        let mut best = Element::Grass;
        let mut best_value = self.contribution(Element::Grass);
        for element in [Element::Bush, Element::Tree] {
            let value = self.contribution(element);
            if value > best_value {
                best = element;
                best_value = value;
            }
        }
        best
    }

    pub fn is_bare(&self) -> bool {
        self.grass_level == 0 && self.bush_level == 0 && self.tree_level == 0
    }
}
