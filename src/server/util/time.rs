pub(crate) mod helper {
    #[cfg(not(test))]
    pub use super::{get_utc_now, today};
    #[cfg(test)]
    pub use super::mock_chrono::{get_utc_now, today};
}

#[cfg(test)]
mod mock_chrono {
    use chrono::{DateTime, NaiveDate};
    use std::cell::Cell;

    thread_local! {
        static MOCK_NOW: Cell<i64> = const { Cell::new(0) };
    }

    pub fn get_utc_now() -> DateTime<chrono::Utc> {
        MOCK_NOW
            .with(|now| DateTime::<chrono::Utc>::from_timestamp(now.get(), 0))
            .expect("invalid timestamp")
    }

    pub fn today() -> NaiveDate {
        get_utc_now().date_naive()
    }
}

#[cfg(not(test))]
pub fn get_utc_now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

/// calendar date the venue is operating under
#[cfg(not(test))]
pub fn today() -> chrono::NaiveDate {
    get_utc_now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::helper;

    #[test]
    fn mock_clock_is_pinned_to_the_epoch() {
        assert_eq!(helper::get_utc_now().timestamp(), 0);
        assert_eq!(helper::today().to_string(), "1970-01-01");
    }
}
