use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu category used for grouping and for suggestion heuristics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Main,
    Side,
    Beverage,
    Dessert,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Side => "Side",
            Self::Beverage => "Beverage",
            Self::Dessert => "Dessert",
        }
    }
}

/// An orderable item. Immutable for the session; owned by the [`Catalog`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: Decimal,
    pub category: Category,
    pub description: String,
    pub modifications_allowed: bool,
    pub available_modifications: Vec<String>,
    pub allergens: Vec<String>,
    /// Preparation time in minutes.
    pub preparation_time: u32,
    /// Current stock level for the item.
    pub available_quantity: u32,
}

/// Price and preparation aggregates for a set of order lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderTotals {
    pub total_price: Decimal,
    /// Items are prepared concurrently, so this is a max, not a sum.
    pub max_preparation_time: u32,
}

/// Read-only lookup of menu items, shared across sessions.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: Vec<MenuItem>,
}

impl Catalog {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.name == name)
    }

    /// All items, in menu order.
    pub fn all(&self) -> &[MenuItem] {
        &self.items
    }

    /// Aggregates price and preparation time over `(name, quantity)` lines.
    /// Names missing from the catalog contribute nothing.
    pub fn totals_for<'a, I>(&self, lines: I) -> OrderTotals
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut total_price = Decimal::ZERO;
        let mut max_preparation_time = 0;
        for (name, quantity) in lines {
            if let Some(menu_item) = self.get(name) {
                total_price += menu_item.price * Decimal::from(quantity);
                max_preparation_time = max_preparation_time.max(menu_item.preparation_time);
            }
        }
        OrderTotals { total_price, max_preparation_time }
    }

    /// Renders the menu block embedded in reasoning-engine prompts.
    pub fn menu_text(&self) -> String {
        let mut text = String::new();
        for item in &self.items {
            let _ = writeln!(text, "- {} ({}) - ${:.2}", item.name, item.category.as_str(), item.price);
            let _ = writeln!(text, "  {}", item.description);
            let _ = writeln!(
                text,
                "  Preparation time: {} minutes. In stock: {}.",
                item.preparation_time, item.available_quantity
            );
            if item.modifications_allowed {
                let _ = writeln!(text, "  Modifications: {}", item.available_modifications.join(", "));
            } else {
                let _ = writeln!(text, "  Modifications: not available for this item");
            }
            if !item.allergens.is_empty() {
                let _ = writeln!(text, "  Allergens: {}", item.allergens.join(", "));
            }
        }
        text
    }
}

fn item(
    name: &str,
    price_cents: i64,
    category: Category,
    description: &str,
    modifications: &[&str],
    allergens: &[&str],
    preparation_time: u32,
    available_quantity: u32,
) -> MenuItem {
    MenuItem {
        name: name.to_owned(),
        price: Decimal::new(price_cents, 2),
        category,
        description: description.to_owned(),
        modifications_allowed: !modifications.is_empty(),
        available_modifications: modifications.iter().map(|m| (*m).to_owned()).collect(),
        allergens: allergens.iter().map(|a| (*a).to_owned()).collect(),
        preparation_time,
        available_quantity,
    }
}

/// The seeded room-service menu used by the default runtime wiring.
pub fn default_catalog() -> Catalog {
    Catalog::new(vec![
        item(
            "Club Sandwich",
            1_500,
            Category::Main,
            "Triple-decker toasted sandwich with chicken, bacon, lettuce, and tomato.",
            &["extra bacon", "no tomato", "no bacon", "gluten-free bread", "extra cheese"],
            &["gluten", "dairy"],
            15,
            12,
        ),
        item(
            "Caesar Salad",
            1_250,
            Category::Main,
            "Romaine hearts, shaved parmesan, and house-made dressing.",
            &["no croutons", "dressing on the side", "add grilled chicken", "no anchovies"],
            &["gluten", "dairy", "fish"],
            10,
            8,
        ),
        item(
            "Margherita Pizza",
            1_800,
            Category::Main,
            "Wood-fired pizza with tomato, fior di latte, and basil.",
            &["extra basil", "no cheese", "gluten-free crust", "well done"],
            &["gluten", "dairy"],
            25,
            6,
        ),
        item(
            "French Fries",
            600,
            Category::Side,
            "Crispy fries with sea salt, served with ketchup and aioli.",
            &["extra salt", "no salt", "truffle oil"],
            &[],
            8,
            5,
        ),
        item(
            "Seasonal Soup",
            850,
            Category::Side,
            "Chef's soup of the day with sourdough croutons.",
            &["no croutons"],
            &["gluten", "dairy"],
            12,
            9,
        ),
        item(
            "Still Water",
            400,
            Category::Beverage,
            "750ml bottle of still mineral water.",
            &[],
            &[],
            1,
            48,
        ),
        item(
            "Sparkling Water",
            450,
            Category::Beverage,
            "750ml bottle of sparkling mineral water.",
            &[],
            &[],
            1,
            36,
        ),
        item(
            "Fresh Orange Juice",
            700,
            Category::Beverage,
            "Freshly squeezed Valencia oranges.",
            &["no pulp", "extra ice", "no ice"],
            &[],
            5,
            10,
        ),
        item(
            "Chocolate Lava Cake",
            1_100,
            Category::Dessert,
            "Warm chocolate cake with a molten center and vanilla ice cream.",
            &["extra berries", "no powdered sugar", "no ice cream"],
            &["gluten", "dairy", "eggs"],
            20,
            4,
        ),
        item(
            "Fruit Platter",
            950,
            Category::Dessert,
            "Selection of seasonal fruit.",
            &["no melon"],
            &[],
            10,
            7,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact_name_match() {
        let catalog = default_catalog();
        assert!(catalog.get("Club Sandwich").is_some());
        assert!(catalog.get("club sandwich").is_none());
        assert!(catalog.get("Lobster Roll").is_none());
    }

    #[test]
    fn seeded_menu_matches_published_constraints() {
        let catalog = default_catalog();

        let sandwich = catalog.get("Club Sandwich").expect("seeded");
        assert_eq!(sandwich.price, Decimal::new(1_500, 2));
        assert_eq!(sandwich.preparation_time, 15);
        assert!(sandwich.modifications_allowed);
        assert!(sandwich.available_modifications.contains(&"extra bacon".to_owned()));

        let water = catalog.get("Still Water").expect("seeded");
        assert!(!water.modifications_allowed);
        assert!(water.available_modifications.is_empty());

        let fries = catalog.get("French Fries").expect("seeded");
        assert_eq!(fries.available_quantity, 5);
    }

    #[test]
    fn menu_text_renders_every_item_with_price() {
        let catalog = default_catalog();
        let text = catalog.menu_text();

        for menu_item in catalog.all() {
            assert!(text.contains(&menu_item.name), "menu text missing {}", menu_item.name);
        }
        assert!(text.contains("$15.00"));
        assert!(text.contains("Modifications: not available for this item"));
    }
}
