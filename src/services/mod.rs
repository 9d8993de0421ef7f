//! Сервисный слой: хранилища каталога и расписания, билеты, брони, токены.
//!
//! Все методы принимают явные аргументы (включая `Principal` для броней) и
//! работают с Postgres напрямую; одна операция - одна транзакция.

pub mod auth;
pub mod catalog;
pub mod reservations;
pub mod scheduling;
pub mod ticketing;

pub use auth::TokenService;
pub use catalog::CatalogStore;
pub use reservations::ReservationEngine;
pub use scheduling::SchedulingStore;
pub use ticketing::TicketingEngine;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// LIMIT/OFFSET для списков
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Page {
            limit: i64::from(page_size),
            offset: i64::from(page - 1) * i64::from(page_size),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_by_default() {
        assert_eq!(Page::default(), Page { limit: 20, offset: 0 });
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(Page::new(Some(3), Some(10)), Page { limit: 10, offset: 20 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { limit: 1, offset: 0 });
        assert_eq!(Page::new(None, Some(5000)).limit, 100);
    }
}
