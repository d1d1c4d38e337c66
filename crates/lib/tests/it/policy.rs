use smart_session::crypto::selector;
use smart_session::policy::{
    CallPermission, ParamCondition, ParamOperator, PermissionId, Policy, PolicyFlag, compute_id,
};
use smart_session::primitives::B256;
use smart_session::primitives::Address;

use super::helpers::*;

#[test]
fn test_compute_id_is_deterministic() {
    let first = compute_id(Some(&sudo_and_gas()));
    let second = compute_id(Some(&sudo_and_gas()));
    assert_eq!(first, second);
    assert_eq!(first.as_bytes().len(), 2);
    assert!(first.to_string().starts_with("0x"));
    assert_eq!(first.to_string().len(), 6);
}

#[test]
fn test_compute_id_is_order_sensitive() {
    let forward = compute_id(Some(&[Policy::sudo(), Policy::gas(1_000_000_000)]));
    let reversed = compute_id(Some(&[Policy::gas(1_000_000_000), Policy::sudo()]));
    assert_ne!(forward, reversed);
}

#[test]
fn test_compute_id_depends_on_parameters_and_flags() {
    let base = compute_id(Some(&[Policy::gas(1)]));
    assert_ne!(base, compute_id(Some(&[Policy::gas(2)])));
    assert_ne!(
        base,
        compute_id(Some(&[Policy::gas(1).with_flag(PolicyFlag::NotForValidateUserOp)]))
    );
}

#[test]
fn test_absent_policies_give_sentinel() {
    assert_eq!(compute_id(None), PermissionId::empty());
    assert_eq!(compute_id(Some(&[])), PermissionId::empty());
}

#[test]
fn test_call_policy_targets_change_id() {
    let a = Policy::call(&[CallPermission::new(Address::repeat_byte(1))]);
    let b = Policy::call(&[CallPermission::new(Address::repeat_byte(2))]);
    assert_ne!(compute_id(Some(&[a])), compute_id(Some(&[b])));
}

#[test]
fn test_argument_conditions_change_id() {
    let mint = CallPermission::new(Address::repeat_byte(0x34)).with_selector(selector("mint(address)"));
    let open = compute_id(Some(&[Policy::call(&[mint.clone()])]));
    let to_self = compute_id(Some(&[Policy::call(&[mint
        .clone()
        .with_condition(ParamCondition::address_equals(0, ACCOUNT))])]));
    let not_to_self = compute_id(Some(&[Policy::call(&[mint.with_condition(
        ParamCondition::new(0, ParamOperator::NotEqual, ACCOUNT.into_word()),
    )])]));
    assert_ne!(open, to_self);
    assert_ne!(to_self, not_to_self);
    assert_eq!(ACCOUNT.into_word(), B256::left_padding_from(ACCOUNT.as_slice()));
}
