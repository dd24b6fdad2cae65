//! Demo catalog: six donations and four open requests.

use chrono::{DateTime, TimeZone, Utc};
use sharecycle_core::{Donation, ItemCategory, ItemCondition, Request};

use crate::Catalog;

const PHOTO_BASE: &str = "https://images.pexels.com/photos";
const PHOTO_QUERY: &str = "auto=compress&cs=tinysrgb&w=400&h=300&dpr=1";

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 10, d, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn photo(path: &str) -> String {
    format!("{PHOTO_BASE}/{path}?{PHOTO_QUERY}")
}

#[allow(clippy::too_many_arguments)]
fn donation(
    id: &str,
    category: ItemCategory,
    description: &str,
    condition: ItemCondition,
    photo_path: &str,
    created: u32,
    donor: (&str, &str, &str, &str),
) -> Donation {
    Donation {
        id: id.into(),
        category,
        description: description.into(),
        condition,
        photo: photo(photo_path),
        created_at: day(created),
        donor_name: donor.0.into(),
        donor_email: donor.1.into(),
        donor_phone: donor.2.into(),
        donor_location: donor.3.into(),
    }
}

fn request(
    id: &str,
    category: ItemCategory,
    description: &str,
    requester: (&str, &str, &str, &str),
) -> Request {
    Request {
        id: id.into(),
        category,
        description: description.into(),
        created_at: day(10),
        requester_name: requester.0.into(),
        requester_email: requester.1.into(),
        requester_phone: requester.2.into(),
        requester_location: requester.3.into(),
    }
}

pub fn donations() -> Vec<Donation> {
    use ItemCategory::*;
    use ItemCondition::*;

    vec![
        donation(
            "d1",
            Electronics,
            "24-inch Dell Monitor, works perfectly",
            Good,
            "1029757/pexels-photo-1029757.jpeg",
            1,
            ("Alice Johnson", "alice.j@example.com", "555-0101", "City Center"),
        ),
        donation(
            "d2",
            Furniture,
            "Sturdy wooden desk with three drawers",
            LikeNew,
            "1148955/pexels-photo-1148955.jpeg",
            2,
            ("Bob Williams", "bob.w@example.com", "555-0102", "North Suburbs"),
        ),
        donation(
            "d3",
            Clothing,
            "Men's winter jacket, size Large",
            Good,
            "52573/winter-jacket-winter-clothes-jacket-52573.jpeg",
            3,
            ("Charlie Brown", "charlie.b@example.com", "555-0103", "Eastside"),
        ),
        donation(
            "d4",
            Books,
            "Collection of 5 classic novels, paperback",
            Fair,
            "220326/pexels-photo-220326.jpeg",
            4,
            ("Diana Prince", "diana.p@example.com", "555-0104", "West End"),
        ),
        donation(
            "d5",
            Kitchenware,
            "Complete set of pots and pans",
            LikeNew,
            "6605207/pexels-photo-6605207.jpeg",
            5,
            ("Eve Adams", "eve.a@example.com", "555-0105", "City Center"),
        ),
        donation(
            "d6",
            Electronics,
            "Old but functional laser printer",
            Fair,
            "265076/pexels-photo-265076.jpeg",
            6,
            ("Frank Miller", "frank.m@example.com", "555-0106", "South Park"),
        ),
    ]
}

pub fn requests() -> Vec<Request> {
    use ItemCategory::*;

    vec![
        request(
            "r1",
            Electronics,
            "Need a computer monitor for remote work.",
            ("Gary Smith", "gary.s@example.com", "555-0107", "West End"),
        ),
        request(
            "r2",
            Furniture,
            "Looking for a small desk for my child to do homework.",
            ("Helen White", "helen.w@example.com", "555-0108", "North Suburbs"),
        ),
        request(
            "r3",
            Clothing,
            "I need a warm coat for the upcoming winter season.",
            ("Ian Green", "ian.g@example.com", "555-0109", "Eastside"),
        ),
        request(
            "r4",
            Books,
            "Any fiction books would be appreciated to start a small library.",
            ("Jane Doe", "jane.d@example.com", "555-0110", "City Center"),
        ),
    ]
}

/// The demo catalog at revision 1.
pub fn catalog() -> Catalog {
    Catalog {
        revision: 1,
        donations: donations(),
        requests: requests(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let d: HashSet<_> = donations().into_iter().map(|d| d.id).collect();
        let r: HashSet<_> = requests().into_iter().map(|r| r.id).collect();
        assert_eq!(d.len(), 6);
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn newest_donation_lists_first() {
        let listed = catalog().donations_newest_first();
        assert_eq!(listed[0].id, "d6");
        assert_eq!(listed[5].id, "d1");
    }

    #[test]
    fn requests_with_equal_timestamps_keep_order() {
        let ids: Vec<String> = catalog()
            .requests_newest_first()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["r1", "r2", "r3", "r4"]);
    }
}
