use std::path::PathBuf;

use powerflow_chat::ChatConfig;
use powerflow_mcp::ServerConfig;

#[test]
fn filesystem_server_reads_the_powerflow_scratch_dir() {
    let chat = ChatConfig::default();
    let filesystem = chat
        .mcp_servers
        .iter()
        .find(|server| server.name == "filesystem")
        .expect("filesystem server configured by default");

    let root = PathBuf::from(filesystem.args.last().unwrap());
    assert_eq!(root, ServerConfig::default().workspace.scratch_dir);
}

#[test]
fn powerflow_server_is_registered_first() {
    let chat = ChatConfig::default();
    assert_eq!(chat.mcp_servers[0].name, "powerflow");
    assert_eq!(chat.mcp_servers[0].command, "powerflow-mcp");
}
