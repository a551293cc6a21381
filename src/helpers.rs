use std::{collections::BTreeMap, fmt, io, str::FromStr};

use crate::{
    error::Error,
    types::{
        Basic_Token_Sender_Type, Borrow_Crosschain_Type, Create_Position_Type,
        Lending_Pool_Created_Type, Pool_Flow_Type, Token_Data_Stream_Type,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventsType {
    LendingPoolCreated,
    BasicTokenSenderAdded,
    TokenDataStreamAdded,
    CreatePosition,
    SupplyLiquidity,
    WithdrawLiquidity,
    SupplyCollateral,
    BorrowDebt,
    BorrowDebtCrosschain,
    RepayWithCollateralByPosition,
    Liquidate,
    SwapToken,
    SwapTokenByPosition,
    WithdrawCollateral,
}

impl EventsType {
    pub const ALL: [EventsType; 14] = [
        EventsType::LendingPoolCreated,
        EventsType::BasicTokenSenderAdded,
        EventsType::TokenDataStreamAdded,
        EventsType::CreatePosition,
        EventsType::SupplyLiquidity,
        EventsType::WithdrawLiquidity,
        EventsType::SupplyCollateral,
        EventsType::BorrowDebt,
        EventsType::BorrowDebtCrosschain,
        EventsType::RepayWithCollateralByPosition,
        EventsType::Liquidate,
        EventsType::SwapToken,
        EventsType::SwapTokenByPosition,
        EventsType::WithdrawCollateral,
    ];
}

impl fmt::Display for EventsType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name: &str = (*self).into();
        write!(f, "{}", name)
    }
}

impl From<EventsType> for &'static str {
    fn from(value: EventsType) -> Self {
        match value {
            EventsType::LendingPoolCreated => "LendingPoolCreated",
            EventsType::BasicTokenSenderAdded => "BasicTokenSenderAdded",
            EventsType::TokenDataStreamAdded => "TokenDataStreamAdded",
            EventsType::CreatePosition => "CreatePosition",
            EventsType::SupplyLiquidity => "SupplyLiquidity",
            EventsType::WithdrawLiquidity => "WithdrawLiquidity",
            EventsType::SupplyCollateral => "SupplyCollateral",
            EventsType::BorrowDebt => "BorrowDebt",
            EventsType::BorrowDebtCrosschain => "BorrowDebtCrosschain",
            EventsType::RepayWithCollateralByPosition => {
                "RepayWithCollateralByPosition"
            },
            EventsType::Liquidate => "Liquidate",
            EventsType::SwapToken => "SwapToken",
            EventsType::SwapTokenByPosition => "SwapTokenByPosition",
            EventsType::WithdrawCollateral => "WithdrawCollateral",
        }
    }
}

impl From<EventsType> for String {
    fn from(value: EventsType) -> Self {
        let name: &str = value.into();
        String::from(name)
    }
}

impl FromStr for EventsType {
    type Err = io::Error;

    fn from_str(value: &str) -> Result<EventsType, Self::Err> {
        EventsType::ALL
            .into_iter()
            .find(|item| {
                let name: &str = (*item).into();
                name == value
            })
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Event not supported: {}", value),
                )
            })
    }
}

fn field(args: &BTreeMap<String, String>, key: &str) -> Result<String, Error> {
    args.get(key)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| Error::FieldNotExist(String::from(key)))
}

pub fn parse_lending_pool_created(
    args: &BTreeMap<String, String>,
) -> Result<Lending_Pool_Created_Type, Error> {
    let c = Lending_Pool_Created_Type {
        lending_pool: field(args, "lendingPool")?,
        collateral_token: field(args, "collateralToken")?,
        borrow_token: field(args, "borrowToken")?,
        ltv: field(args, "ltv")?,
    };

    Ok(c)
}

pub fn parse_basic_token_sender_added(
    args: &BTreeMap<String, String>,
) -> Result<Basic_Token_Sender_Type, Error> {
    let c = Basic_Token_Sender_Type {
        chain_id: field(args, "chainId")?,
        basic_token_sender: field(args, "basicTokenSender")?,
    };

    Ok(c)
}

pub fn parse_token_data_stream_added(
    args: &BTreeMap<String, String>,
) -> Result<Token_Data_Stream_Type, Error> {
    let c = Token_Data_Stream_Type {
        token: field(args, "token")?,
        data_stream: field(args, "dataStream")?,
    };

    Ok(c)
}

pub fn parse_create_position(
    args: &BTreeMap<String, String>,
) -> Result<Create_Position_Type, Error> {
    let c = Create_Position_Type {
        user: field(args, "user")?,
        position_address: field(args, "positionAddress")?,
    };

    Ok(c)
}

/// Supply, withdraw, borrow and repay payloads. `with_shares` makes the
/// `shares` argument mandatory.
pub fn parse_pool_flow(
    args: &BTreeMap<String, String>,
    with_shares: bool,
) -> Result<Pool_Flow_Type, Error> {
    let shares = if with_shares {
        Some(field(args, "shares")?)
    } else {
        None
    };

    let c = Pool_Flow_Type {
        user: field(args, "user")?,
        amount: field(args, "amount")?,
        shares,
    };

    Ok(c)
}

pub fn parse_borrow_crosschain(
    args: &BTreeMap<String, String>,
) -> Result<Borrow_Crosschain_Type, Error> {
    let c = Borrow_Crosschain_Type {
        user: field(args, "user")?,
        amount: field(args, "amount")?,
        shares: field(args, "shares")?,
        chain_id: field(args, "chainId")?,
        bridge_token_sender: field(args, "bridgeTokenSender")?,
    };

    Ok(c)
}

/// `{left}-{right}` identity used for activity rows and composite keys.
pub fn composite_id(left: &str, right: impl fmt::Display) -> String {
    format!("{}-{}", left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn event_names_round_trip() {
        for item in EventsType::ALL {
            assert_eq!(EventsType::from_str(&item.to_string()).unwrap(), item);
        }
        assert!(EventsType::from_str("Transfer").is_err());
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let data = args(&[("user", "0xU1"), ("amount", "5")]);
        let err = parse_pool_flow(&data, true).unwrap_err();
        assert!(matches!(err, Error::FieldNotExist(ref key) if key == "shares"));

        let parsed = parse_pool_flow(&data, false).unwrap();
        assert_eq!(parsed.user, "0xU1");
        assert!(parsed.shares.is_none());
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let data = args(&[("token", "0xT"), ("dataStream", "")]);
        assert!(parse_token_data_stream_added(&data).is_err());
    }
}
