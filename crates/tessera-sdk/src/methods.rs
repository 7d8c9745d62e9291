//! Wrappers for well-known node methods
//!
//! Each wrapper forwards its arguments, serialized in order, as the params of
//! the named method and returns the raw `result`. Any method not listed here
//! is still reachable through [`RpcClient::call`].

use serde::Serialize;
use serde_json::Value;

use crate::client::RpcClient;
use crate::SdkError;

macro_rules! rpc_methods {
    ($( $(#[$meta:meta])* $name:ident => $method:literal ( $($arg:ident),* ); )*) => {
        impl RpcClient {
            $(
                $(#[$meta])*
                pub async fn $name(
                    &mut self,
                    $($arg: impl Serialize + Send,)*
                ) -> Result<Value, SdkError> {
                    let params: Vec<Value> = vec![$(serde_json::to_value($arg)?),*];
                    self.call($method, params).await
                }
            )*
        }

        /// Node method names with a generated wrapper
        pub const KNOWN_METHODS: &[&str] = &[$($method),*];
    };
}

rpc_methods! {
    /// `eth_coinbase`
    eth_coinbase => "eth_coinbase"();
    /// `eth_accounts`
    eth_accounts => "eth_accounts"();
    /// `eth_blockNumber`
    eth_block_number => "eth_blockNumber"();
    /// `eth_gasPrice`
    eth_gas_price => "eth_gasPrice"();
    /// `eth_getBalance(address, block)`
    eth_get_balance => "eth_getBalance"(address, block);
    /// `eth_getTransactionCount(address, block)`
    eth_get_transaction_count => "eth_getTransactionCount"(address, block);
    /// `eth_getCode(address, block)`
    eth_get_code => "eth_getCode"(address, block);
    /// `eth_getTransactionReceipt(hash)`
    eth_get_transaction_receipt => "eth_getTransactionReceipt"(hash);
    /// `eth_getBlockByNumber(block, full_transactions)`
    eth_get_block_by_number => "eth_getBlockByNumber"(block, full);
    /// `eth_sendTransaction(tx)`
    eth_send_transaction => "eth_sendTransaction"(tx);
    /// `eth_call(tx, block)`
    eth_call_raw => "eth_call"(tx, block);
    /// `eth_estimateGas(tx)`
    eth_estimate_gas => "eth_estimateGas"(tx);
    /// `net_version`
    net_version => "net_version"();
    /// `web3_clientVersion`
    web3_client_version => "web3_clientVersion"();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockId;
    use crate::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_wrapper_forwards_params_in_order() {
        let mock = MockTransport::new();
        let mut client = RpcClient::new(mock.clone());

        client
            .eth_get_balance("0x407d73d8a49eeb85d32cf465507dd71d507100c1", BlockId::Latest)
            .await
            .unwrap();

        let sent = mock.requests_for("eth_getBalance");
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].params,
            vec![json!("0x407d73d8a49eeb85d32cf465507dd71d507100c1"), json!("latest")]
        );
    }

    #[tokio::test]
    async fn test_wrapper_without_params() {
        let mut client = RpcClient::new(MockTransport::new());
        assert_eq!(client.net_version().await.unwrap(), json!("1"));
    }

    #[test]
    fn test_known_methods_listed() {
        assert!(KNOWN_METHODS.contains(&"eth_getTransactionReceipt"));
        assert!(KNOWN_METHODS.contains(&"eth_call"));
    }
}
