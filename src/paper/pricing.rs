//! Win probabilities, payouts and outcomes for digit contracts

use rust_decimal::Decimal;

use crate::common::types::{ContractType, Digit, VenueError};

/// Chance that a contract wins, in tenths
///
/// Rejects contracts that can never win or are missing their barrier.
pub fn win_tenths(contract_type: ContractType, barrier: Option<Digit>) -> Result<u8, VenueError> {
    let required = || {
        barrier.ok_or_else(|| {
            VenueError::new("MissingBarrier", format!("{contract_type} needs a barrier digit"))
        })
    };

    let tenths = match contract_type {
        ContractType::DigitMatch => {
            required()?;
            1
        }
        ContractType::DigitDiff => {
            required()?;
            9
        }
        ContractType::DigitOver => 9 - required()?.value(),
        ContractType::DigitUnder => required()?.value(),
        ContractType::DigitEven
        | ContractType::DigitOdd
        | ContractType::Call
        | ContractType::Put => 5,
    };

    if tenths == 0 {
        return Err(VenueError::new(
            "InvalidBarrier",
            format!("{contract_type} cannot win with this barrier"),
        ));
    }
    Ok(tenths)
}

/// Amount paid back on a win: fair odds less the house margin, to the cent
pub fn payout(stake: Decimal, tenths: u8, house_margin: Decimal) -> Decimal {
    let fair = stake * Decimal::TEN / Decimal::from(tenths);
    (fair * (Decimal::ONE - house_margin)).round_dp(2)
}

/// Whether a contract won given its entry and exit quotes
pub fn is_win(
    contract_type: ContractType,
    barrier: Option<Digit>,
    entry: Decimal,
    exit: Decimal,
) -> bool {
    let digit = Digit::from_quote(exit);
    let barrier = barrier.unwrap_or(Digit::ZERO);
    match contract_type {
        ContractType::DigitMatch => digit == barrier,
        ContractType::DigitDiff => digit != barrier,
        ContractType::DigitOver => digit > barrier,
        ContractType::DigitUnder => digit < barrier,
        ContractType::DigitEven => digit.is_even(),
        ContractType::DigitOdd => !digit.is_even(),
        ContractType::Call => exit > entry,
        ContractType::Put => exit < entry,
    }
}
