//! Bookshop sample data: `BookMaster`, `BookCustomer`, `BookInventory`, `BookOrder`.

use chrono::NaiveDate;

use gridsql_core::Record;

use crate::grid::Grid;

/// Package holding the bookshop domain types.
pub const DOMAIN_PACKAGE: &str = "gridsql.domain";

pub const BOOK_MASTER: &str = "BookMaster";
pub const BOOK_CUSTOMER: &str = "BookCustomer";
pub const BOOK_INVENTORY: &str = "BookInventory";
pub const BOOK_ORDER: &str = "BookOrder";

/// Every bookshop region, in the order they are usually exposed.
pub const BOOKSHOP_REGIONS: [&str; 4] = [BOOK_MASTER, BOOK_CUSTOMER, BOOK_INVENTORY, BOOK_ORDER];

fn domain(type_name: &str) -> Record {
    Record::new(format!("{DOMAIN_PACKAGE}.{type_name}"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// A member named `name` holding the bookshop regions.
pub fn bookshop(name: &str) -> Grid {
    let grid = Grid::new(name);
    seed_bookshop(&grid);
    grid
}

/// Load the bookshop regions into `grid`, replacing entries with the same keys.
pub fn seed_bookshop(grid: &Grid) {
    let books = [
        (
            123,
            "Run on sentences and drivel on all things mundane",
            34.99,
            2011,
            "Daisy Mae West",
            "A Treatise of Treatises",
        ),
        (
            456,
            "A book about a dog",
            11.99,
            1971,
            "Clarence Meeks",
            "Clifford the Big Red Dog",
        ),
        (
            789,
            "Theoretical information about the structure of Operating Systems",
            59.99,
            2011,
            "Jim Heavisides",
            "Operating Systems: An Introduction",
        ),
        (
            999,
            "Seasonal catalog, handed out at the counter",
            0.0,
            2023,
            "Bookshop Staff",
            "Spring Catalog",
        ),
    ];
    for (item, description, cost, year, author, title) in books {
        grid.put(
            BOOK_MASTER,
            item.to_string(),
            domain(BOOK_MASTER)
                .with("itemNumber", item)
                .with("description", description)
                .with("retailCost", cost)
                .with("yearPublished", year)
                .with("author", author)
                .with("title", title),
        );
    }

    let inventory = [
        (123, "Lexington", 10),
        (456, "Lexington", 4),
        (789, "Springfield", 36),
        (999, "Lexington", 250),
    ];
    for (item, warehouse, quantity) in inventory {
        grid.put(
            BOOK_INVENTORY,
            item.to_string(),
            domain(BOOK_INVENTORY)
                .with("itemNumber", item)
                .with("warehouse", warehouse)
                .with("quantityInStock", quantity),
        );
    }

    let customers = [
        (5598, "Kari", "Powell", "123 Main St", "Topeka"),
        (5543, "Lula", "Wax", "123 Main St", "Topeka"),
        (6024, "Trenton", "Garcia", "2 Elm Ave", "Springfield"),
    ];
    for (number, first, last, address, city) in customers {
        grid.put(
            BOOK_CUSTOMER,
            number.to_string(),
            domain(BOOK_CUSTOMER)
                .with("customerNumber", number)
                .with("firstName", first)
                .with("lastName", last)
                .with("addressLine1", address)
                .with("city", city),
        );
    }

    let orders = [
        (17699, date(2024, 3, 9), 5598, 123, 40.98),
        (17700, date(2024, 3, 11), 5543, 456, 16.98),
        (17701, date(2024, 4, 2), 6024, 789, 59.99),
    ];
    for (number, ordered_on, customer, item, total) in orders {
        grid.put(
            BOOK_ORDER,
            number.to_string(),
            domain(BOOK_ORDER)
                .with("orderNumber", number)
                .with("orderDate", ordered_on)
                .with("customerNumber", customer)
                .with("itemNumber", item)
                .with("totalPrice", total),
        );
    }
}
