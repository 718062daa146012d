//! ERC-20 token contract, the subset the exchange client calls

use ethers::contract::abigen;

abigen!(
    TokenContract,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#
);
