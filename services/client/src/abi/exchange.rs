//! Exchange contract: reserves, LP token, liquidity and swaps

use ethers::contract::abigen;

abigen!(
    ExchangeContract,
    r#"[
        function getReserve() external view returns (uint256)
        function balanceOf(address account) external view returns (uint256)
        function totalSupply() external view returns (uint256)
        function getAmountOfTokens(uint256 inputAmount, uint256 inputReserve, uint256 outputReserve) external pure returns (uint256)
        function addLiquidity(uint256 amount) external payable returns (uint256)
        function removeLiquidity(uint256 amount) external returns (uint256, uint256)
        function ethToCryptoDevToken(uint256 minTokens) external payable
        function cryptoDevTokenToEth(uint256 tokensSold, uint256 minEth) external
    ]"#
);
